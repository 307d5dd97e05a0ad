use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::ConfigHandle;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub configured: bool,
}

/// GET /api/health: liveness plus whether the store is configured.
pub async fn health(State(config): State<ConfigHandle>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        configured: config.store().await.is_complete(),
    })
}
