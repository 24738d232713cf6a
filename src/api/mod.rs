//! API module
//!
//! HTTP API endpoints and middleware.

mod baptism;
mod events;
mod extract;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::store::DocumentStore;

pub use routes::create_router;

/// Shared state handed to every endpoint
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    /// Lowercase hex SHA-256 of the accepted X-API-Key
    pub api_key_sha256: Option<String>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            api_key_sha256: None,
        }
    }

    pub fn with_api_key_hash(mut self, hash: impl Into<String>) -> Self {
        self.api_key_sha256 = Some(hash.into());
        self
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // Layers run last-added first: identity -> logging -> handler
    let api_routes = create_router()
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::identity_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
