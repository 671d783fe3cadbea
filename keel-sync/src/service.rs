//! Configuration service.
//!
//! Typed operations over the [`Coordinator`]. Each operation checks the
//! shape of its input, builds the matching [`Mutation`], and unpacks the
//! outcome.

use std::sync::Arc;

use keel_core::error::{KeelError, Result};
use keel_core::types::{CadenceUpdate, CompanyConfig, EmailCadence, FieldRename, HubSpotField, NewCadence, NewField};

use crate::coordinator::{Applied, Coordinator, Mutation};

/// Field and cadence operations for the HTTP layer and the CLI.
#[derive(Clone)]
pub struct ConfigService {
    coordinator: Arc<Coordinator>,
}

impl ConfigService {
    /// Creates a service over a coordinator.
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    /// Adds a field and returns it as stored.
    pub async fn add_field(&self, field: NewField) -> Result<HubSpotField> {
        match self.coordinator.apply(Mutation::AddField(field)).await? {
            Applied::Field(stored) => Ok(stored),
            other => Err(unexpected("add_field", &other)),
        }
    }

    /// Renames a field.
    ///
    /// Fails with `FieldNotFound` if the company has no field called `old_name`.
    pub async fn modify_field(&self, company_id: &str, old_name: &str, new_name: &str) -> Result<()> {
        let rename = FieldRename::new(company_id, old_name, new_name);
        self.coordinator.apply(Mutation::RenameField(rename)).await?;
        Ok(())
    }

    /// Deletes a field.
    pub async fn delete_field(&self, company_id: &str, name: &str) -> Result<()> {
        let mutation = Mutation::DeleteField {
            company_id: company_id.to_string(),
            name: name.to_string(),
        };
        self.coordinator.apply(mutation).await?;
        Ok(())
    }

    /// Provisions a cadence and returns it as stored.
    pub async fn add_cadence(&self, cadence: NewCadence) -> Result<EmailCadence> {
        match self.coordinator.apply(Mutation::AddCadence(cadence)).await? {
            Applied::Cadence(stored) => Ok(stored),
            other => Err(unexpected("add_cadence", &other)),
        }
    }

    /// Updates a cadence addressed by `company_id`.
    ///
    /// `update.company_id` may be left empty; if set, it must match.
    pub async fn modify_cadence(&self, company_id: &str, mut update: CadenceUpdate) -> Result<()> {
        if !update.company_id.is_empty() && update.company_id != company_id {
            return Err(KeelError::InvalidInput(format!(
                "body company_id '{}' does not match path company_id '{}'",
                update.company_id, company_id
            )));
        }
        update.company_id = company_id.to_string();

        self.coordinator.apply(Mutation::UpdateCadence(update)).await?;
        Ok(())
    }

    /// Reads a company's configuration through the cache.
    pub async fn get_config(&self, company_id: &str) -> Result<CompanyConfig> {
        self.coordinator.read(company_id).await
    }
}

fn unexpected(op: &str, applied: &Applied) -> KeelError {
    KeelError::InternalError(format!("{op} produced {applied:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use test_case::test_case;

    fn service() -> (Harness, ConfigService) {
        let h = Harness::new();
        let coordinator = Arc::new(Coordinator::new(h.store.clone(), h.cache.clone()));
        (h, ConfigService::new(coordinator))
    }

    fn cadence_update(company: &str) -> CadenceUpdate {
        CadenceUpdate {
            company_id: company.into(),
            cadence_id: "c1".into(),
            template: "follow-up".into(),
            delay_hours: 48,
        }
    }

    #[tokio::test]
    async fn test_add_echoes_stored_field() {
        let (_h, svc) = service();
        let stored = svc.add_field(NewField::new("acme", "tier", "string", "gold")).await.unwrap();
        assert_eq!(stored.name, "tier");
        assert!(stored.id > 0);
    }

    #[tokio::test]
    async fn test_modify_missing_field_is_not_found() {
        let (_h, svc) = service();
        let result = svc.modify_field("acme", "tier", "plan").await;
        assert!(matches!(result, Err(KeelError::FieldNotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_invalidates_and_removes() {
        let (h, svc) = service();
        svc.add_field(NewField::new("acme", "tier", "string", "gold")).await.unwrap();
        assert!(h.cached_snapshot("acme").is_some());

        svc.delete_field("acme", "tier").await.unwrap();
        assert!(h.cached_snapshot("acme").is_none());
        assert!(svc.get_config("acme").await.unwrap().hubspot_fields.is_empty());
    }

    #[test_case("" ; "company taken from path")]
    #[test_case("acme" ; "matching company")]
    #[tokio::test]
    async fn test_modify_cadence_accepts(body_company: &str) {
        let (_h, svc) = service();
        svc.add_cadence(NewCadence {
            company_id: "acme".into(),
            cadence_id: "c1".into(),
            template: "welcome".into(),
            delay_hours: 24,
        })
        .await
        .unwrap();

        svc.modify_cadence("acme", cadence_update(body_company)).await.unwrap();
        let config = svc.get_config("acme").await.unwrap();
        assert_eq!(config.cadence("c1").unwrap().template, "follow-up");
    }

    #[tokio::test]
    async fn test_modify_cadence_rejects_mismatched_company() {
        let (h, svc) = service();
        let result = svc.modify_cadence("acme", cadence_update("globex")).await;
        assert!(matches!(result, Err(KeelError::InvalidInput(_))));
        assert_eq!(h.store.cadence_count(), 0);
    }

    #[tokio::test]
    async fn test_get_config_serves_from_cache_after_add() {
        let (h, svc) = service();
        let stored = svc.add_field(NewField::new("acme", "tier", "string", "gold")).await.unwrap();

        // Remove the row behind the cache's back; the cached snapshot still answers.
        h.store.clear();
        let config = svc.get_config("acme").await.unwrap();
        assert_eq!(config.hubspot_fields, vec![stored]);
    }
}
