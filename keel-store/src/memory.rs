//! In-memory configuration store.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, instrument};

use keel_core::error::{KeelError, Result};
use keel_core::traits::ConfigStore;
use keel_core::types::{CompanyConfig, EmailCadence, HubSpotField, NewCadence, NewField};

/// Rows owned by one company.
#[derive(Debug, Default)]
struct CompanyRows {
    fields: Vec<HubSpotField>,
    cadences: Vec<EmailCadence>,
}

/// In-memory configuration store.
///
/// # Layout
///
/// - Company → rows: every mutation of a company runs under that company's
///   map entry, which makes each statement atomic
/// - Cadence id → company: enforces global cadence uniqueness
///
/// # Thread Safety
///
/// All operations are thread-safe and can be called concurrently.
#[derive(Debug)]
pub struct MemoryStore {
    companies: DashMap<String, CompanyRows>,
    cadence_index: DashMap<String, String>,
    next_field_id: AtomicI64,
    next_cadence_id: AtomicI64,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            companies: DashMap::new(),
            cadence_index: DashMap::new(),
            next_field_id: AtomicI64::new(1),
            next_cadence_id: AtomicI64::new(1),
        }
    }

    /// Returns the number of stored fields across all companies.
    pub fn field_count(&self) -> usize {
        self.companies.iter().map(|c| c.fields.len()).sum()
    }

    /// Returns the number of stored cadences across all companies.
    pub fn cadence_count(&self) -> usize {
        self.cadence_index.len()
    }

    /// Removes every row.
    pub fn clear(&self) {
        self.companies.clear();
        self.cadence_index.clear();
        self.next_field_id.store(1, Ordering::SeqCst);
        self.next_cadence_id.store(1, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    #[instrument(skip(self, field), fields(company_id = %field.company_id, name = %field.name))]
    async fn insert_field(&self, field: &NewField) -> Result<HubSpotField> {
        let mut rows = self.companies.entry(field.company_id.clone()).or_default();

        if rows.fields.iter().any(|f| f.name == field.name) {
            return Err(KeelError::ConstraintViolation(format!(
                "field '{}' already exists for company '{}'",
                field.name, field.company_id
            )));
        }

        let id = self.next_field_id.fetch_add(1, Ordering::SeqCst);
        let stored = field.clone().into_field(id);
        rows.fields.push(stored.clone());

        debug!(id, "Inserted field");
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn rename_field(&self, company_id: &str, old_name: &str, new_name: &str) -> Result<u64> {
        let Some(mut rows) = self.companies.get_mut(company_id) else {
            return Ok(0);
        };

        let Some(idx) = rows.fields.iter().position(|f| f.name == old_name) else {
            return Ok(0);
        };

        if old_name != new_name && rows.fields.iter().any(|f| f.name == new_name) {
            return Err(KeelError::ConstraintViolation(format!(
                "field '{new_name}' already exists for company '{company_id}'"
            )));
        }

        rows.fields[idx].name = new_name.to_string();
        Ok(1)
    }

    #[instrument(skip(self))]
    async fn delete_field(&self, company_id: &str, name: &str) -> Result<u64> {
        let Some(mut rows) = self.companies.get_mut(company_id) else {
            return Ok(0);
        };

        let before = rows.fields.len();
        rows.fields.retain(|f| f.name != name);
        Ok((before - rows.fields.len()) as u64)
    }

    #[instrument(skip(self, cadence), fields(company_id = %cadence.company_id, cadence_id = %cadence.cadence_id))]
    async fn insert_cadence(&self, cadence: &NewCadence) -> Result<EmailCadence> {
        // Lock order: company rows, then the cadence index shard.
        let mut rows = self.companies.entry(cadence.company_id.clone()).or_default();

        match self.cadence_index.entry(cadence.cadence_id.clone()) {
            Entry::Occupied(_) => Err(KeelError::ConstraintViolation(format!(
                "cadence '{}' already exists",
                cadence.cadence_id
            ))),
            Entry::Vacant(slot) => {
                let id = self.next_cadence_id.fetch_add(1, Ordering::SeqCst);
                let stored = cadence.clone().into_cadence(id);
                rows.cadences.push(stored.clone());
                slot.insert(cadence.company_id.clone());

                debug!(id, "Inserted cadence");
                Ok(stored)
            }
        }
    }

    #[instrument(skip(self, template))]
    async fn update_cadence(
        &self,
        company_id: &str,
        cadence_id: &str,
        template: &str,
        delay_hours: u32,
    ) -> Result<u64> {
        let Some(mut rows) = self.companies.get_mut(company_id) else {
            return Ok(0);
        };

        match rows.cadences.iter_mut().find(|c| c.cadence_id == cadence_id) {
            Some(cadence) => {
                cadence.template = template.to_string();
                cadence.delay_hours = delay_hours;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    #[instrument(skip(self))]
    async fn load_company(&self, company_id: &str) -> Result<CompanyConfig> {
        let mut config = CompanyConfig::empty(company_id);

        if let Some(rows) = self.companies.get(company_id) {
            config.hubspot_fields = rows.fields.clone();
            config.upso_cadences = rows.cadences.clone();
        }

        config.hubspot_fields.sort_by_key(|f| f.id);
        config.upso_cadences.sort_by_key(|c| c.id);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier() -> NewField {
        NewField::new("acme", "tier", "string", "gold")
    }

    fn cadence(company: &str, id: &str) -> NewCadence {
        NewCadence {
            company_id: company.into(),
            cadence_id: id.into(),
            template: "welcome".into(),
            delay_hours: 24,
        }
    }

    #[tokio::test]
    async fn test_insert_and_load() {
        let store = MemoryStore::new();
        let field = store.insert_field(&tier()).await.unwrap();
        assert_eq!(field.id, 1);

        let config = store.load_company("acme").await.unwrap();
        assert_eq!(config.hubspot_fields, vec![field]);
    }

    #[tokio::test]
    async fn test_duplicate_field_rejected() {
        let store = MemoryStore::new();
        store.insert_field(&tier()).await.unwrap();

        let result = store.insert_field(&tier()).await;
        assert!(matches!(result, Err(KeelError::ConstraintViolation(_))));
        assert_eq!(store.field_count(), 1);

        // Same name under another company is fine
        let other = NewField::new("globex", "tier", "string", "silver");
        assert!(store.insert_field(&other).await.is_ok());
    }

    #[tokio::test]
    async fn test_rename_field() {
        let store = MemoryStore::new();
        store.insert_field(&tier()).await.unwrap();

        assert_eq!(store.rename_field("acme", "tier", "plan").await.unwrap(), 1);
        let config = store.load_company("acme").await.unwrap();
        assert!(config.field("plan").is_some());
        assert!(config.field("tier").is_none());
    }

    #[tokio::test]
    async fn test_rename_missing_affects_zero_rows() {
        let store = MemoryStore::new();
        assert_eq!(store.rename_field("acme", "tier", "plan").await.unwrap(), 0);

        store.insert_field(&tier()).await.unwrap();
        assert_eq!(store.rename_field("acme", "nope", "plan").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rename_onto_existing_name_rejected() {
        let store = MemoryStore::new();
        store.insert_field(&tier()).await.unwrap();
        store
            .insert_field(&NewField::new("acme", "plan", "string", "pro"))
            .await
            .unwrap();

        let result = store.rename_field("acme", "tier", "plan").await;
        assert!(matches!(result, Err(KeelError::ConstraintViolation(_))));
    }

    #[tokio::test]
    async fn test_delete_field() {
        let store = MemoryStore::new();
        store.insert_field(&tier()).await.unwrap();

        assert_eq!(store.delete_field("acme", "tier").await.unwrap(), 1);
        assert_eq!(store.delete_field("acme", "tier").await.unwrap(), 0);
        assert_eq!(store.field_count(), 0);
    }

    #[tokio::test]
    async fn test_cadence_ids_globally_unique() {
        let store = MemoryStore::new();
        store.insert_cadence(&cadence("acme", "c1")).await.unwrap();

        let result = store.insert_cadence(&cadence("globex", "c1")).await;
        assert!(matches!(result, Err(KeelError::ConstraintViolation(_))));
        assert_eq!(store.cadence_count(), 1);
    }

    #[tokio::test]
    async fn test_update_cadence_scoped_to_company() {
        let store = MemoryStore::new();
        store.insert_cadence(&cadence("acme", "c1")).await.unwrap();

        assert_eq!(store.update_cadence("globex", "c1", "x", 1).await.unwrap(), 0);
        assert_eq!(store.update_cadence("acme", "c1", "follow-up", 48).await.unwrap(), 1);

        let config = store.load_company("acme").await.unwrap();
        let updated = config.cadence("c1").unwrap();
        assert_eq!(updated.template, "follow-up");
        assert_eq!(updated.delay_hours, 48);
    }

    #[tokio::test]
    async fn test_load_unknown_company_is_empty() {
        let store = MemoryStore::new();
        let config = store.load_company("nobody").await.unwrap();
        assert_eq!(config, CompanyConfig::empty("nobody"));
    }

    #[tokio::test]
    async fn test_concurrent_inserts_same_name() {
        use std::sync::Arc;
        use tokio::task::JoinSet;

        let store = Arc::new(MemoryStore::new());
        let mut tasks = JoinSet::new();

        for i in 0..50 {
            let store = store.clone();
            tasks.spawn(async move {
                let field = NewField::new("acme", "tier", "string", format!("v{i}"));
                store.insert_field(&field).await.is_ok()
            });
        }

        let mut successes = 0;
        while let Some(result) = tasks.join_next().await {
            if result.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(store.field_count(), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = MemoryStore::new();
        store.insert_field(&tier()).await.unwrap();
        store.insert_cadence(&cadence("acme", "c1")).await.unwrap();

        store.clear();

        assert_eq!(store.field_count(), 0);
        assert_eq!(store.cadence_count(), 0);
    }
}
