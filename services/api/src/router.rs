//! Axum Router Configuration
//!
//! The service surface is deliberately small: a liveness check, the list of
//! declared LLM providers, and the WebSocket bridge endpoint.

use crate::{handlers, state::AppState, ws::ws_handler};
use axum::{Router, routing::get};
use std::sync::Arc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/providers", get(handlers::list_providers))
        .route("/ws/control", get(ws_handler))
        .with_state(app_state)
}
