//! Store/cache consistency coordinator.
//!
//! # Protocol
//!
//! For each [`Mutation`], under the company's lock:
//!
//! 1. validate the command
//! 2. apply it to the durable store (bounded by `store_timeout`)
//! 3. apply the mutation's [`CachePolicy`] (bounded by `cache_timeout`)
//!
//! The cache is only touched after step 2 succeeded and changed something,
//! with one exception: a store call that timed out may still have committed,
//! so its company entry is invalidated before the timeout is reported.
//! Cache failures in step 3 are logged and never fail the mutation; the
//! worst outcome is a missing entry, which the next read repopulates.
//!
//! Read misses repopulate under the same company lock, so a slow reader can
//! never cache a snapshot that predates a completed mutation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use keel_core::constants::{
    cache_key, DEFAULT_CACHE_TIMEOUT_MS, DEFAULT_CACHE_TTL_SECONDS, DEFAULT_STORE_TIMEOUT_MS,
};
use keel_core::error::{KeelError, Result};
use keel_core::traits::{ConfigCache, ConfigStore};
use keel_core::types::{
    CadenceUpdate, CompanyConfig, EmailCadence, FieldRename, HubSpotField, NewCadence, NewField,
};

use crate::locks::KeyedLocks;

/// Coordinator tuning.
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    /// Lifetime of cached snapshots; zero never expires
    pub cache_ttl: Duration,
    /// Deadline for one durable store call
    pub store_timeout: Duration,
    /// Deadline for one cache call
    pub cache_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            cache_timeout: Duration::from_millis(DEFAULT_CACHE_TIMEOUT_MS),
        }
    }
}

/// What happens to the company's cache entry after a durable write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CachePolicy {
    /// Rebuild the snapshot from the store and cache it.
    WriteThrough,
    /// Delete the cached snapshot.
    Invalidate,
}

/// A change to one company's configuration.
#[derive(Clone, Debug)]
pub enum Mutation {
    /// Create a field.
    AddField(NewField),
    /// Rename a field.
    RenameField(FieldRename),
    /// Delete a field.
    DeleteField {
        /// Owning company
        company_id: String,
        /// Field to delete
        name: String,
    },
    /// Provision a cadence.
    AddCadence(NewCadence),
    /// Change a cadence's template and delay.
    UpdateCadence(CadenceUpdate),
}

impl Mutation {
    /// The company whose lock and cache entry the mutation uses.
    pub fn company_id(&self) -> &str {
        match self {
            Mutation::AddField(f) => &f.company_id,
            Mutation::RenameField(r) => &r.company_id,
            Mutation::DeleteField { company_id, .. } => company_id,
            Mutation::AddCadence(c) => &c.company_id,
            Mutation::UpdateCadence(u) => &u.company_id,
        }
    }

    /// Cache policy applied after a successful durable write.
    ///
    /// Only field adds are written through; they cache a value the
    /// coordinator itself just produced under the company lock.
    pub fn cache_policy(&self) -> CachePolicy {
        match self {
            Mutation::AddField(_) => CachePolicy::WriteThrough,
            _ => CachePolicy::Invalidate,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Mutation::AddField(_) => "add_field",
            Mutation::RenameField(_) => "rename_field",
            Mutation::DeleteField { .. } => "delete_field",
            Mutation::AddCadence(_) => "add_cadence",
            Mutation::UpdateCadence(_) => "update_cadence",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Mutation::AddField(f) => f.validate(),
            Mutation::RenameField(r) => r.validate(),
            Mutation::DeleteField { company_id, name } => {
                if company_id.trim().is_empty() || name.trim().is_empty() {
                    return Err(KeelError::ValidationError(
                        "company_id and name are required".into(),
                    ));
                }
                Ok(())
            }
            Mutation::AddCadence(c) => c.validate(),
            Mutation::UpdateCadence(u) => u.validate(),
        }
    }
}

/// Result of a successful mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Applied {
    /// A field was created.
    Field(HubSpotField),
    /// A cadence was created.
    Cadence(EmailCadence),
    /// Existing rows were changed.
    Updated,
}

/// Orchestrates durable writes and cache maintenance.
pub struct Coordinator {
    store: Arc<dyn ConfigStore>,
    cache: Arc<dyn ConfigCache>,
    locks: KeyedLocks,
    config: CoordinatorConfig,
}

impl Coordinator {
    /// Creates a coordinator with default tuning.
    pub fn new(store: Arc<dyn ConfigStore>, cache: Arc<dyn ConfigCache>) -> Self {
        Self::with_config(store, cache, CoordinatorConfig::default())
    }

    /// Creates a coordinator with custom tuning.
    pub fn with_config(
        store: Arc<dyn ConfigStore>,
        cache: Arc<dyn ConfigCache>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            cache,
            locks: KeyedLocks::new(),
            config,
        }
    }

    /// Applies a mutation to the store, then to the cache.
    #[instrument(skip(self, mutation), fields(op = mutation.kind(), company_id = %mutation.company_id()))]
    pub async fn apply(&self, mutation: Mutation) -> Result<Applied> {
        let company_id = mutation.company_id().to_string();
        let _guard = self.locks.lock(&company_id).await;

        mutation.validate()?;

        let policy = mutation.cache_policy();
        let applied = match self.write(mutation).await {
            Ok(applied) => applied,
            Err(err @ KeelError::StoreTimeout { .. }) => {
                // Outcome unknown; the delete is safe either way.
                warn!(company_id = %company_id, error = %err, "Store write timed out, invalidating");
                self.invalidate(&company_id).await;
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        match policy {
            CachePolicy::WriteThrough => self.repopulate(&company_id).await,
            CachePolicy::Invalidate => self.invalidate(&company_id).await,
        }

        info!(company_id = %company_id, ?policy, "Mutation applied");
        Ok(applied)
    }

    /// Returns a company's configuration, from the cache when possible.
    #[instrument(skip(self))]
    pub async fn read(&self, company_id: &str) -> Result<CompanyConfig> {
        if company_id.trim().is_empty() {
            return Err(KeelError::ValidationError("company_id is required".into()));
        }

        if let Some(config) = self.cached(company_id).await {
            return Ok(config);
        }

        let _guard = self.locks.lock(company_id).await;

        // A writer may have cached a fresh snapshot while we waited.
        if let Some(config) = self.cached(company_id).await {
            return Ok(config);
        }

        let config = self.store_call(self.store.load_company(company_id)).await?;
        if let Err(err) = self.cache_snapshot(&config).await {
            warn!(company_id, error = %err, "Failed to populate cache");
        }
        Ok(config)
    }

    /// Durable write. Zero affected rows means the addressed row is absent.
    async fn write(&self, mutation: Mutation) -> Result<Applied> {
        match mutation {
            Mutation::AddField(field) => {
                let stored = self.store_call(self.store.insert_field(&field)).await?;
                Ok(Applied::Field(stored))
            }
            Mutation::RenameField(rename) => {
                let rows = self
                    .store_call(self.store.rename_field(
                        &rename.company_id,
                        &rename.old_name,
                        &rename.new_name,
                    ))
                    .await?;
                if rows == 0 {
                    return Err(KeelError::FieldNotFound {
                        company_id: rename.company_id,
                        name: rename.old_name,
                    });
                }
                Ok(Applied::Updated)
            }
            Mutation::DeleteField { company_id, name } => {
                let rows = self
                    .store_call(self.store.delete_field(&company_id, &name))
                    .await?;
                if rows == 0 {
                    return Err(KeelError::FieldNotFound { company_id, name });
                }
                Ok(Applied::Updated)
            }
            Mutation::AddCadence(cadence) => {
                let stored = self.store_call(self.store.insert_cadence(&cadence)).await?;
                Ok(Applied::Cadence(stored))
            }
            Mutation::UpdateCadence(update) => {
                let rows = self
                    .store_call(self.store.update_cadence(
                        &update.company_id,
                        &update.cadence_id,
                        &update.template,
                        update.delay_hours,
                    ))
                    .await?;
                if rows == 0 {
                    return Err(KeelError::CadenceNotFound {
                        company_id: update.company_id,
                        cadence_id: update.cadence_id,
                    });
                }
                Ok(Applied::Updated)
            }
        }
    }

    /// Rebuilds the company's snapshot from the store and caches it.
    ///
    /// Falls back to invalidation so a failed rebuild can't leave an older
    /// snapshot behind.
    async fn repopulate(&self, company_id: &str) {
        let result = async {
            let config = self.store_call(self.store.load_company(company_id)).await?;
            self.cache_snapshot(&config).await
        }
        .await;

        if let Err(err) = result {
            if err.is_cache_error() {
                warn!(company_id, error = %err, "Cache write-through failed, invalidating");
            } else {
                warn!(company_id, error = %err, "Snapshot reload failed, invalidating");
            }
            self.invalidate(company_id).await;
        }
    }

    async fn invalidate(&self, company_id: &str) {
        let key = cache_key(company_id);
        match self.cache_call(self.cache.delete(&key)).await {
            Ok(()) => debug!(key = %key, "Cache entry invalidated"),
            Err(err) => warn!(key = %key, error = %err, "Cache invalidation failed"),
        }
    }

    async fn cache_snapshot(&self, config: &CompanyConfig) -> Result<()> {
        let raw = config.to_json()?;
        let key = cache_key(&config.company_id);
        self.cache_call(self.cache.set(&key, raw, self.config.cache_ttl))
            .await
    }

    /// Cache lookup that degrades every failure to a miss.
    async fn cached(&self, company_id: &str) -> Option<CompanyConfig> {
        let key = cache_key(company_id);
        match self.cache_call(self.cache.get(&key)).await {
            Ok(Some(raw)) => match CompanyConfig::from_json(&raw) {
                Ok(config) => {
                    debug!(key = %key, "Cache hit");
                    Some(config)
                }
                Err(err) => {
                    warn!(key = %key, error = %err, "Discarding undecodable cache entry");
                    self.invalidate(company_id).await;
                    None
                }
            },
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                None
            }
            Err(err) => {
                warn!(key = %key, error = %err, "Cache read failed, falling back to store");
                None
            }
        }
    }

    async fn store_call<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        let limit = self.config.store_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(KeelError::StoreTimeout {
                millis: millis(limit),
            }))
    }

    async fn cache_call<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        let limit = self.config.cache_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(KeelError::CacheTimeout {
                millis: millis(limit),
            }))
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}
