//! Liveness endpoint.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use crate::AppState;
use crate::error::AppResult;
use crate::models::HealthResponse;

/// `GET /health`: reports the crate version and store connectivity.
pub async fn health_handler(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let store_connected = state.stores.credentials.ping().await;
    if !store_connected {
        warn!("store unreachable");
    }
    Ok(Json(HealthResponse {
        status: if store_connected { "ok" } else { "degraded" }.to_string(),
        version: docvault_core::version().to_string(),
        store_connected,
    }))
}
