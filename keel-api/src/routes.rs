//! API route configuration.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))

        // Fields
        .route("/fields/add", post(handlers::add_field))
        .route("/fields/modify/:company_id/:old_name", put(handlers::modify_field))
        .route("/fields/:company_id/:name", delete(handlers::delete_field))

        // Cadences
        .route("/cadence/add", post(handlers::add_cadence))
        .route("/cadence/modify/:company_id", put(handlers::modify_cadence))

        // Reads
        .route("/config/:company_id", get(handlers::get_config))

        .with_state(state)
}
