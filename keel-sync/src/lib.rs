//! # keel sync
//!
//! Keeps the cache consistent with the durable store.
//!
//! Every mutation runs as validate → durable write → cache step while
//! holding its company's lock:
//!
//! - **Adds** are written through: the company snapshot is rebuilt from the
//!   store and cached.
//! - **Modifications and deletes** are written then invalidated: the cached
//!   snapshot is deleted and the next read repopulates it.
//!
//! A failed store write aborts before the cache is touched, except a timed
//! out one, which may have committed and so invalidates before reporting.
//! A failed cache step is logged and the mutation still succeeds.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use keel_sync::{ConfigService, Coordinator};
//!
//! let coordinator = Coordinator::new(Arc::new(MemoryStore::new()), Arc::new(MemoryCache::new()));
//! let service = ConfigService::new(Arc::new(coordinator));
//!
//! service.add_field(NewField::new("acme", "tier", "string", "gold")).await?;
//! service.modify_field("acme", "tier", "plan").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod coordinator;
mod locks;
mod service;

#[cfg(test)]
mod testing;

pub use coordinator::{Applied, CachePolicy, Coordinator, CoordinatorConfig, Mutation};
pub use locks::{KeyGuard, KeyedLocks};
pub use service::ConfigService;
