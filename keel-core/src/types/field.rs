//! HubSpot field records and the commands that mutate them.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use super::require;

/// A named, typed configuration value scoped to a company.
///
/// `(company_id, name)` is unique in the durable store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubSpotField {
    /// Store-assigned identifier
    pub id: i64,
    /// Owning company
    pub company_id: String,
    /// Field name, unique within the company
    pub name: String,
    /// Open-ended type tag (e.g. "string", "number")
    #[serde(rename = "type")]
    pub field_type: String,
    /// Opaque payload
    pub value: String,
}

/// Command to create a field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewField {
    /// Owning company
    pub company_id: String,
    /// Field name
    pub name: String,
    /// Type tag
    #[serde(rename = "type")]
    pub field_type: String,
    /// Opaque payload
    pub value: String,
}

impl NewField {
    /// Creates a new field command.
    pub fn new(
        company_id: impl Into<String>,
        name: impl Into<String>,
        field_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            company_id: company_id.into(),
            name: name.into(),
            field_type: field_type.into(),
            value: value.into(),
        }
    }

    /// Checks that every addressing attribute is present.
    ///
    /// The value is opaque and may be empty.
    pub fn validate(&self) -> Result<()> {
        require("company_id", &self.company_id)?;
        require("name", &self.name)?;
        require("type", &self.field_type)?;
        Ok(())
    }

    /// Builds the stored record once the store has assigned an id.
    pub fn into_field(self, id: i64) -> HubSpotField {
        HubSpotField {
            id,
            company_id: self.company_id,
            name: self.name,
            field_type: self.field_type,
            value: self.value,
        }
    }
}

/// Command to rename a field within a company.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldRename {
    /// Owning company
    pub company_id: String,
    /// Current name
    pub old_name: String,
    /// Name to apply
    pub new_name: String,
}

impl FieldRename {
    /// Creates a rename command.
    pub fn new(
        company_id: impl Into<String>,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        Self {
            company_id: company_id.into(),
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }

    /// Checks that the company, the current name and the new name are present.
    pub fn validate(&self) -> Result<()> {
        require("company_id", &self.company_id)?;
        require("old_name", &self.old_name)?;
        require("new_name", &self.new_name)?;
        Ok(())
    }
}
