//! Company configuration snapshots.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use super::{EmailCadence, HubSpotField};

/// Everything configured for one company, as held in the cache.
///
/// Snapshots are derived from the durable store and carry no authority of
/// their own.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyConfig {
    /// Company the snapshot belongs to
    pub company_id: String,
    /// Fields ordered by id
    pub hubspot_fields: Vec<HubSpotField>,
    /// Cadences ordered by id
    pub upso_cadences: Vec<EmailCadence>,
}

impl CompanyConfig {
    /// Creates an empty snapshot for a company.
    pub fn empty(company_id: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            ..Self::default()
        }
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&HubSpotField> {
        self.hubspot_fields.iter().find(|f| f.name == name)
    }

    /// Looks up a cadence by id.
    pub fn cadence(&self, cadence_id: &str) -> Option<&EmailCadence> {
        self.upso_cadences.iter().find(|c| c.cadence_id == cadence_id)
    }

    /// Serializes the snapshot for the cache.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes a cached snapshot.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
