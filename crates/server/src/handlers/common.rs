//! Health check handler.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use wayquest_metadata::MetadataStore;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health - Liveness probe checking metadata connectivity.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state
        .metadata
        .health_check()
        .await
        .map_err(|e| ApiError::Unavailable(format!("metadata store unreachable: {e}")))?;

    Ok(Json(HealthResponse { status: "ok" }))
}
