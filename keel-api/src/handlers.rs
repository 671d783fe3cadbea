//! API route handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use tracing::info;

use keel_core::types::{CompanyConfig, EmailCadence, HubSpotField};

use crate::dto::*;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// POST /fields/add
pub async fn add_field(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<AddFieldRequest>, JsonRejection>,
) -> Result<Json<DataResponse<HubSpotField>>> {
    let Json(req) = payload?;

    let field = state
        .service
        .add_field(req.into())
        .await
        .map_err(|e| ApiError::from_service(e, "Database insertion failed"))?;

    info!(company_id = %field.company_id, name = %field.name, id = field.id, "Added field");

    Ok(Json(DataResponse {
        message: "Field added successfully".into(),
        data: field,
    }))
}

/// PUT /fields/modify/:company_id/:old_name
pub async fn modify_field(
    State(state): State<Arc<AppState>>,
    Path((company_id, old_name)): Path<(String, String)>,
    payload: std::result::Result<Json<ModifyFieldRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(req) = payload?;

    state
        .service
        .modify_field(&company_id, &old_name, &req.new_name)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to update field"))?;

    info!(company_id = %company_id, old_name = %old_name, new_name = %req.new_name, "Modified field");

    Ok(Json(MessageResponse::new("Field modified successfully")))
}

/// DELETE /fields/:company_id/:name
pub async fn delete_field(
    State(state): State<Arc<AppState>>,
    Path((company_id, name)): Path<(String, String)>,
) -> Result<Json<MessageResponse>> {
    state
        .service
        .delete_field(&company_id, &name)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to delete field"))?;

    info!(company_id = %company_id, name = %name, "Deleted field");

    Ok(Json(MessageResponse::new("Field deleted successfully")))
}

/// POST /cadence/add
pub async fn add_cadence(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<AddCadenceRequest>, JsonRejection>,
) -> Result<Json<DataResponse<EmailCadence>>> {
    let Json(req) = payload?;

    let cadence = state
        .service
        .add_cadence(req.into())
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to create email cadence"))?;

    info!(company_id = %cadence.company_id, cadence_id = %cadence.cadence_id, "Added cadence");

    Ok(Json(DataResponse {
        message: "Cadence added successfully".into(),
        data: cadence,
    }))
}

/// PUT /cadence/modify/:company_id
pub async fn modify_cadence(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<String>,
    payload: std::result::Result<Json<ModifyCadenceRequest>, JsonRejection>,
) -> Result<&'static str> {
    let Json(req) = payload?;
    let cadence_id = req.cadence_id.clone();

    state
        .service
        .modify_cadence(&company_id, req.into())
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to update email cadence"))?;

    info!(company_id = %company_id, cadence_id = %cadence_id, "Modified cadence");

    Ok("Cadence updated successfully")
}

/// GET /config/:company_id
pub async fn get_config(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<String>,
) -> Result<Json<CompanyConfig>> {
    let config = state
        .service
        .get_config(&company_id)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to load configuration"))?;

    Ok(Json(config))
}

static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// GET /health
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Json<HealthResponse> {
    let start = START_TIME.get_or_init(Instant::now);

    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: start.elapsed().as_secs(),
        cache_backend: state.cache.name().into(),
        cached_companies: state.cache.as_memory().map(|cache| cache.stats().valid_entries),
        durable_store: state.config.database_url.is_some(),
    })
}
