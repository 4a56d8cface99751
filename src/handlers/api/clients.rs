use axum::{extract::State, Extension, Json};

use crate::app::AppState;
use crate::database::models::{Client, SessionUser};
use crate::forms::NewClientForm;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/clients - newest first
pub async fn list(State(state): State<AppState>, Extension(user): Extension<SessionUser>) -> ApiResult<Vec<Client>> {
    let clients = state.workspace(user).clients().await?;
    Ok(ApiResponse::success(clients))
}

/// POST /api/clients
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(form): Json<NewClientForm>,
) -> ApiResult<Client> {
    let client = state.workspace(user).create_client(form).await?;
    Ok(ApiResponse::created(client))
}
