use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use uuid::Uuid;

use super::projects::render_detail;
use super::{page_context, to_login, PageResult};
use crate::app::AppState;
use crate::database::models::SessionUser;
use crate::database::Workspace;
use crate::error::ApiError;
use crate::forms::NewTaskForm;
use crate::handlers::parse_id;

#[derive(Debug, Default, Deserialize)]
pub struct DeleteConfirmation {
    #[serde(default)]
    pub confirm: String,
}

fn back_to(project_id: Uuid) -> Response {
    Redirect::to(&format!("/projects/{}", project_id)).into_response()
}

/// Re-renders the project page with `err` above the task list.
async fn project_with_error(
    state: &AppState,
    workspace: &Workspace,
    project_id: Uuid,
    task_title: &str,
    err: ApiError,
) -> PageResult {
    let user = workspace.user();
    let detail = workspace
        .project(project_id)
        .await
        .map_err(|e| state.page_error(Some(user), e))?;
    render_detail(state, user, detail, task_title, Some(err))
}

/// POST /projects/:id/tasks
pub async fn create(
    State(state): State<AppState>,
    user: Option<Extension<SessionUser>>,
    Path(id): Path<String>,
    Form(form): Form<NewTaskForm>,
) -> PageResult {
    let Some(Extension(user)) = user else {
        return Err(state.page_error(None, ApiError::unauthorized("You must be logged in to add a task")));
    };
    let project_id = parse_id(&id, "Project").map_err(|e| state.page_error(Some(&user), e))?;
    let workspace = state.workspace(user.clone());

    let title = form.title.clone();
    match workspace.add_task(project_id, form).await {
        Ok(_) => Ok(back_to(project_id)),
        Err(err) => {
            let err = ApiError::from(err);
            if err.status() == StatusCode::NOT_FOUND {
                return Err(state.page_error(Some(&user), err));
            }
            project_with_error(&state, &workspace, project_id, &title, err).await
        }
    }
}

/// POST /tasks/:id/toggle
pub async fn toggle(
    State(state): State<AppState>,
    user: Option<Extension<SessionUser>>,
    Path(id): Path<String>,
) -> PageResult {
    let Some(Extension(user)) = user else {
        return Ok(to_login());
    };
    let task_id = parse_id(&id, "Task").map_err(|e| state.page_error(Some(&user), e))?;
    let workspace = state.workspace(user.clone());

    let task = workspace
        .task(task_id)
        .await
        .map_err(|e| state.page_error(Some(&user), e))?;

    match workspace.toggle_task(task_id).await {
        Ok(_) => Ok(back_to(task.project_id)),
        Err(err) => project_with_error(&state, &workspace, task.project_id, "", err.into()).await,
    }
}

/// GET /tasks/:id/delete - asks before anything is removed
pub async fn confirm_delete(
    State(state): State<AppState>,
    user: Option<Extension<SessionUser>>,
    Path(id): Path<String>,
) -> PageResult {
    let Some(Extension(user)) = user else {
        return Ok(to_login());
    };
    let task_id = parse_id(&id, "Task").map_err(|e| state.page_error(Some(&user), e))?;
    let task = state
        .workspace(user.clone())
        .task(task_id)
        .await
        .map_err(|e| state.page_error(Some(&user), e))?;

    let mut context = page_context(Some(&user));
    context.insert("task", &task);
    state.render_page("confirm_delete.html", &context, StatusCode::OK)
}

/// POST /tasks/:id/delete - deletes only with `confirm=yes`
pub async fn delete(
    State(state): State<AppState>,
    user: Option<Extension<SessionUser>>,
    Path(id): Path<String>,
    Form(confirmation): Form<DeleteConfirmation>,
) -> PageResult {
    let Some(Extension(user)) = user else {
        return Ok(to_login());
    };
    let task_id = parse_id(&id, "Task").map_err(|e| state.page_error(Some(&user), e))?;
    let workspace = state.workspace(user.clone());

    let task = workspace
        .task(task_id)
        .await
        .map_err(|e| state.page_error(Some(&user), e))?;

    if confirmation.confirm != "yes" {
        return Ok(back_to(task.project_id));
    }

    match workspace.delete_task(task_id).await {
        Ok(_) => Ok(back_to(task.project_id)),
        Err(err) => project_with_error(&state, &workspace, task.project_id, "", err.into()).await,
    }
}
