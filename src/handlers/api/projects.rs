use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::database::models::{Project, ProjectDetail, ProjectWithClient, SessionUser};
use crate::forms::NewProjectForm;
use crate::handlers::pages::projects::ProjectsQuery;
use crate::handlers::parse_id;
use crate::listing::ProjectFilter;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/projects?status= - newest first, each with its client
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<ProjectsQuery>,
) -> ApiResult<Vec<ProjectWithClient>> {
    let projects = state.workspace(user).projects().await?;
    let filter = ProjectFilter::from_query(query.status.as_deref());
    let visible: Vec<ProjectWithClient> = filter.apply(&projects).into_iter().cloned().collect();
    Ok(ApiResponse::success(visible))
}

/// POST /api/projects
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(form): Json<NewProjectForm>,
) -> ApiResult<Project> {
    let project = state.workspace(user).create_project(form).await?;
    Ok(ApiResponse::created(project))
}

/// GET /api/projects/:id - project, client and tasks
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> ApiResult<ProjectDetail> {
    let id = parse_id(&id, "Project")?;
    let detail = state.workspace(user).project(id).await?;
    Ok(ApiResponse::success(detail))
}
