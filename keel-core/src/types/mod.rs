//! Domain types for keel.
//!
//! - [`HubSpotField`]: a named, typed configuration value scoped to a company
//! - [`EmailCadence`]: a per-company email scheduling rule
//! - [`CompanyConfig`]: the snapshot of one company held in the cache

mod cadence;
mod config;
mod field;

pub use cadence::*;
pub use config::*;
pub use field::*;

use crate::error::{KeelError, Result};

/// Rejects empty or whitespace-only required values.
pub(crate) fn require(label: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(KeelError::ValidationError(format!("{label} is required")));
    }
    Ok(())
}
