//! Health handler

use crate::api::rest::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub broadcasts: BroadcastCounts,
}

/// Directory size by status
#[derive(Debug, Serialize, Deserialize)]
pub struct BroadcastCounts {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    let counts = state.registry.counts().await;

    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
        broadcasts: BroadcastCounts {
            total: counts.total,
            active: counts.active,
            inactive: counts.inactive,
        },
    })
}
