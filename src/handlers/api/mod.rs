//! JSON API over the same workspace the pages use.

pub mod auth;
pub mod clients;
pub mod projects;
pub mod tasks;

use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::SessionUser;
use crate::database::DashboardCounts;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /health - 200 when the record store answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    state.store.health_check().await.map_err(|err| {
        tracing::warn!("Health check failed: {}", err);
        ApiError::service_unavailable("Record store unavailable")
    })?;
    Ok(ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "database": "ok"
    })))
}

/// GET /api/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<DashboardCounts> {
    let counts = state.workspace(user).dashboard().await?;
    Ok(ApiResponse::success(counts))
}
