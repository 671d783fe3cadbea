//! UPSO email cadence records.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use super::require;

/// A per-company email scheduling rule.
///
/// `cadence_id` is unique across all companies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailCadence {
    /// Store-assigned identifier
    pub id: i64,
    /// Owning company
    pub company_id: String,
    /// Globally unique cadence identifier
    pub cadence_id: String,
    /// Opaque template text
    pub template: String,
    /// Delay before sending, in hours
    pub delay_hours: u32,
}

/// Command to provision a cadence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCadence {
    /// Owning company
    pub company_id: String,
    /// Globally unique cadence identifier
    pub cadence_id: String,
    /// Template text
    pub template: String,
    /// Delay in hours
    pub delay_hours: u32,
}

impl NewCadence {
    /// Checks that the addressing attributes are present.
    pub fn validate(&self) -> Result<()> {
        require("company_id", &self.company_id)?;
        require("cadence_id", &self.cadence_id)?;
        Ok(())
    }

    /// Builds the stored record once the store has assigned an id.
    pub fn into_cadence(self, id: i64) -> EmailCadence {
        EmailCadence {
            id,
            company_id: self.company_id,
            cadence_id: self.cadence_id,
            template: self.template,
            delay_hours: self.delay_hours,
        }
    }
}

/// Command to change a cadence's template and delay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CadenceUpdate {
    /// Owning company
    pub company_id: String,
    /// Cadence to update
    pub cadence_id: String,
    /// New template text
    pub template: String,
    /// New delay in hours
    pub delay_hours: u32,
}

impl CadenceUpdate {
    /// Checks that the addressing attributes are present.
    pub fn validate(&self) -> Result<()> {
        require("company_id", &self.company_id)?;
        require("cadence_id", &self.cadence_id)?;
        Ok(())
    }
}
