//! Adapter traits for keel.
//!
//! The durable store and the cache are long-lived, process-wide handles
//! injected into the coordinator, so tests can swap either for a fake.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CompanyConfig, EmailCadence, HubSpotField, NewCadence, NewField};

// ═══════════════════════════════════════════════════════════════════════════════
// DURABLE STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface to the system of record.
///
/// Every mutation is durable once it returns `Ok`. Updates report the number
/// of rows they touched; zero is not an error at this layer.
///
/// Implementations might use:
/// - In-memory maps (for testing/development)
/// - libSQL/SQLite (for production)
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Inserts a field and returns it with its assigned id.
    ///
    /// Fails with `ConstraintViolation` if `(company_id, name)` already exists.
    async fn insert_field(&self, field: &NewField) -> Result<HubSpotField>;

    /// Renames a field within a company.
    ///
    /// Fails with `ConstraintViolation` if `new_name` is already taken.
    async fn rename_field(&self, company_id: &str, old_name: &str, new_name: &str) -> Result<u64>;

    /// Deletes a field.
    async fn delete_field(&self, company_id: &str, name: &str) -> Result<u64>;

    /// Inserts a cadence and returns it with its assigned id.
    ///
    /// Fails with `ConstraintViolation` if `cadence_id` already exists.
    async fn insert_cadence(&self, cadence: &NewCadence) -> Result<EmailCadence>;

    /// Replaces a cadence's template and delay.
    async fn update_cadence(
        &self,
        company_id: &str,
        cadence_id: &str,
        template: &str,
        delay_hours: u32,
    ) -> Result<u64>;

    /// Reads everything configured for a company.
    async fn load_company(&self, company_id: &str) -> Result<CompanyConfig>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface to the key-value cache.
///
/// The cache is never the system of record: a miss always means "consult
/// the store".
#[async_trait]
pub trait ConfigCache: Send + Sync {
    /// Stores a value. A zero `ttl` means the entry never expires.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Fetches a value, `None` on miss or expiry.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Removes a value. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;
}
