//! Broadcast directory handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use beacon_registry::{BroadcastInfo, BroadcastStatus, RegisterBroadcast, RegistryError};
use serde::{Deserialize, Serialize};

/// List broadcasts query params
#[derive(Debug, Deserialize)]
pub struct ListBroadcastsQuery {
    pub status: Option<String>,
}

/// Empty JSON object body
#[derive(Debug, Serialize)]
pub struct EmptyResponse {}

/// Register a broadcaster, or refresh an existing one.
///
/// Responds 201 for a first registration and 200 for a heartbeat.
pub async fn register_broadcast(
    State(state): State<AppState>,
    payload: Result<Json<RegisterBroadcast>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BroadcastInfo>)> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let outcome = state.registry.register(request).await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(outcome.record.into())))
}

/// List broadcasts
///
/// Listing never fails: an unreadable query or unknown `status` value
/// falls back to the unfiltered directory.
pub async fn list_broadcasts(
    State(state): State<AppState>,
    query: Result<Query<ListBroadcastsQuery>, QueryRejection>,
) -> Json<Vec<BroadcastInfo>> {
    let status = match query {
        Ok(Query(query)) => query.status.as_deref().and_then(status_filter),
        Err(e) => {
            tracing::debug!(error = %e.body_text(), "Ignoring unreadable list query");
            None
        }
    };

    // Snapshot is taken and released before serialization
    let records = state.registry.list(status).await;
    Json(records.into_iter().map(BroadcastInfo::from).collect())
}

fn status_filter(raw: &str) -> Option<BroadcastStatus> {
    match raw.parse::<BroadcastStatus>() {
        Ok(status) => Some(status),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unknown status filter");
            None
        }
    }
}

/// An id the router cannot decode was never registered.
fn path_broadcaster_id(path: Result<Path<String>, PathRejection>) -> ApiResult<String> {
    let Path(broadcaster_id) = path.map_err(|e| {
        tracing::debug!(error = %e.body_text(), "Undecodable broadcaster id");
        ApiError::from(RegistryError::broadcast_not_found())
    })?;
    Ok(broadcaster_id)
}

/// Get a specific broadcast
pub async fn get_broadcast(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<BroadcastInfo>> {
    let broadcaster_id = path_broadcaster_id(path)?;
    let record = state.registry.get(&broadcaster_id).await?;
    Ok(Json(record.into()))
}

/// Deregister a broadcaster
pub async fn deregister_broadcast(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<EmptyResponse>> {
    let broadcaster_id = path_broadcaster_id(path)?;
    state.registry.deregister(&broadcaster_id).await?;
    Ok(Json(EmptyResponse {}))
}

/// Fallback for unmatched routes
pub async fn route_not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}
