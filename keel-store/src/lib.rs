//! # keel store
//!
//! Durable storage for company configuration records.
//!
//! This crate provides two backends for [`ConfigStore`]:
//!
//! - **Memory**: in-process maps for development and testing
//! - **Sql**: libSQL/SQLite (local file or remote Turso) with parameterized
//!   statements, behind the `sql` feature
//!
//! ## Example
//!
//! ```rust,ignore
//! use keel_store::{MemoryStore, ConfigStore};
//!
//! let store = MemoryStore::new();
//! let field = store.insert_field(&NewField::new("acme", "tier", "string", "gold")).await?;
//! let renamed = store.rename_field("acme", "tier", "plan").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memory;
#[cfg(feature = "sql")]
mod sql;

pub use memory::MemoryStore;
#[cfg(feature = "sql")]
pub use sql::SqlStore;

// Re-export the trait from core
pub use keel_core::traits::ConfigStore;
