//! # keel API Server
//!
//! REST surface for per-company configuration.
//!
//! ## Endpoints
//!
//! - `POST /fields/add` - Add a field (written through to the cache)
//! - `PUT /fields/modify/:company_id/:old_name` - Rename a field (cache invalidated)
//! - `DELETE /fields/:company_id/:name` - Delete a field (cache invalidated)
//! - `POST /cadence/add` - Provision an email cadence
//! - `PUT /cadence/modify/:company_id` - Update an email cadence (cache invalidated)
//! - `GET /config/:company_id` - Read a company's configuration through the cache
//! - `GET /health` - Liveness and cache statistics
//!
//! ## Example
//!
//! ```rust,ignore
//! use keel_api::{ApiServer, ApiConfig};
//!
//! let server = ApiServer::from_config(ApiConfig::from_env()).await?;
//! server.run(([0, 0, 0, 0], 8080)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{ApiConfig, AppState, CacheBackend};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use keel_core::Result;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// API server for keel.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a server over prepared state.
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Connects the configured store and builds a server.
    pub async fn from_config(config: ApiConfig) -> Result<Self> {
        Ok(Self::new(AppState::connect(config).await?))
    }

    /// Creates the router with all routes configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        create_router(self.state.clone())
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("keel API server listening on {}", addr);

        axum::serve(listener, self.router()).await
    }
}
