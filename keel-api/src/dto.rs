//! DTOs for API requests and responses.

use serde::{Deserialize, Serialize};
use keel_core::types::{CadenceUpdate, NewCadence, NewField};

/// Request to add a field.
#[derive(Debug, Deserialize)]
pub struct AddFieldRequest {
    /// Owning company
    pub company_id: String,
    /// Field name
    pub name: String,
    /// Type tag
    #[serde(rename = "type")]
    pub field_type: String,
    /// Opaque value
    pub value: String,
}

impl From<AddFieldRequest> for NewField {
    fn from(req: AddFieldRequest) -> Self {
        NewField::new(req.company_id, req.name, req.field_type, req.value)
    }
}

/// Request to rename a field; company and old name come from the path.
#[derive(Debug, Deserialize)]
pub struct ModifyFieldRequest {
    /// Name to apply
    pub new_name: String,
}

/// Request to provision a cadence.
#[derive(Debug, Deserialize)]
pub struct AddCadenceRequest {
    pub company_id: String,
    pub cadence_id: String,
    pub template: String,
    pub delay_hours: u32,
}

impl From<AddCadenceRequest> for NewCadence {
    fn from(req: AddCadenceRequest) -> Self {
        NewCadence {
            company_id: req.company_id,
            cadence_id: req.cadence_id,
            template: req.template,
            delay_hours: req.delay_hours,
        }
    }
}

/// Request to update a cadence; the company comes from the path.
#[derive(Debug, Deserialize)]
pub struct ModifyCadenceRequest {
    /// Optional: must match the path when present
    #[serde(default)]
    pub company_id: String,
    pub cadence_id: String,
    pub template: String,
    pub delay_hours: u32,
}

impl From<ModifyCadenceRequest> for CadenceUpdate {
    fn from(req: ModifyCadenceRequest) -> Self {
        CadenceUpdate {
            company_id: req.company_id,
            cadence_id: req.cadence_id,
            template: req.template,
            delay_hours: req.delay_hours,
        }
    }
}

/// Confirmation without payload.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Confirmation echoing the stored entity.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub message: String,
    pub data: T,
}

/// Response for health check.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Cache backend in use (`memory` or `redis`)
    pub cache_backend: String,
    /// Live entries in the in-process cache; not reported for Redis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_companies: Option<usize>,
    /// Whether a durable database is configured
    pub durable_store: bool,
}
