use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::{SessionUser, Task};
use crate::error::ApiError;
use crate::forms::NewTaskForm;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// GET /api/projects/:id/tasks
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Task>> {
    let project_id = parse_id(&id, "Project")?;
    let tasks = state.workspace(user).tasks(project_id).await?;
    Ok(ApiResponse::success(tasks))
}

/// POST /api/projects/:id/tasks - only `title` is read; new tasks are always todo
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    Json(form): Json<NewTaskForm>,
) -> ApiResult<Task> {
    let project_id = parse_id(&id, "Project")?;
    let task = state.workspace(user).add_task(project_id, form).await?;
    Ok(ApiResponse::created(task))
}

/// POST /api/tasks/:id/toggle
pub async fn toggle(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> ApiResult<Task> {
    let task_id = parse_id(&id, "Task")?;
    let task = state.workspace(user).toggle_task(task_id).await?;
    Ok(ApiResponse::success(task))
}

/// DELETE /api/tasks/:id?confirm=true - responds with the removed task
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<Task> {
    let task_id = parse_id(&id, "Task")?;
    if !query.confirm {
        return Err(ApiError::bad_request("Deletion must be confirmed with ?confirm=true"));
    }
    let task = state.workspace(user).delete_task(task_id).await?;
    Ok(ApiResponse::success(task))
}
