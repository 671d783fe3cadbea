//! # keel core
//!
//! Core types, errors, and traits shared by every keel crate:
//!
//! - **Types**: per-company configuration records and mutation commands
//! - **Errors**: the error taxonomy used from the adapters up to the HTTP layer
//! - **Constants**: cache key layout and operational defaults
//! - **Traits**: the durable store and cache adapter seams
//!
//! ## Example
//!
//! ```rust
//! use keel_core::{cache_key, NewField};
//!
//! let field = NewField::new("acme", "tier", "string", "gold");
//! assert!(field.validate().is_ok());
//! assert_eq!(cache_key("acme"), "config:acme");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{KeelError, Result};
pub use traits::*;
pub use types::*;
