//! HTTP handlers for the (small) REST surface.

use crate::state::AppState;
use axum::{extract::State, response::Json};
use serde_json::{Value, json};
use std::sync::Arc;

/// Liveness check.
pub async fn health() -> Json<Value> {
    Json(json!({ "message": "Amadeus robot bridge is running." }))
}

/// Names of all providers declared in the registry file.
pub async fn list_providers(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.registry.names())
}
