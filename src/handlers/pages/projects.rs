use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Extension, Form,
};
use serde::Deserialize;

use super::{page_context, to_login, PageResult};
use crate::app::AppState;
use crate::database::models::{ClientSummary, ProjectDetail, ProjectStatus, ProjectWithClient, SessionUser};
use crate::database::Workspace;
use crate::error::ApiError;
use crate::forms::NewProjectForm;
use crate::handlers::parse_id;
use crate::listing::{filter_tabs, ProjectFilter, TaskBuckets};

#[derive(Debug, Default, Deserialize)]
pub struct ProjectsQuery {
    pub status: Option<String>,
}

struct ProjectsPage<'a> {
    user: Option<&'a SessionUser>,
    projects: Vec<ProjectWithClient>,
    client_options: Vec<ClientSummary>,
    filter: ProjectFilter,
    form: NewProjectForm,
    show_form: bool,
    error: Option<String>,
    status: StatusCode,
}

fn render(state: &AppState, page: ProjectsPage<'_>) -> PageResult {
    let mut form = page.form;
    if form.status.is_empty() {
        form.status = ProjectStatus::default().to_string();
    }
    let statuses: Vec<&str> = ProjectStatus::ALL.iter().map(|s| s.as_str()).collect();
    let visible = page.filter.apply(&page.projects);

    let mut context = page_context(page.user);
    context.insert("projects", &visible);
    context.insert("total", &page.projects.len());
    context.insert("tabs", &filter_tabs(&page.projects, page.filter));
    context.insert("client_options", &page.client_options);
    context.insert("statuses", &statuses);
    context.insert("form", &form);
    context.insert("show_form", &page.show_form);
    context.insert("error", &page.error);
    state.render_page("projects.html", &context, page.status)
}

/// GET /projects?status=all|active|completed
///
/// One scoped fetch; the status tab only narrows what is shown.
pub async fn index(
    State(state): State<AppState>,
    user: Option<Extension<SessionUser>>,
    Query(query): Query<ProjectsQuery>,
) -> PageResult {
    let Some(Extension(user)) = user else {
        return Ok(to_login());
    };
    let workspace = state.workspace(user.clone());
    let (projects, client_options) = load(&workspace)
        .await
        .map_err(|e| state.page_error(Some(&user), e))?;

    render(
        &state,
        ProjectsPage {
            user: Some(&user),
            projects,
            client_options,
            filter: ProjectFilter::from_query(query.status.as_deref()),
            form: NewProjectForm::default(),
            show_form: false,
            error: None,
            status: StatusCode::OK,
        },
    )
}

async fn load(workspace: &Workspace) -> Result<(Vec<ProjectWithClient>, Vec<ClientSummary>), ApiError> {
    Ok((workspace.projects().await?, workspace.client_options().await?))
}

/// POST /projects
pub async fn create(
    State(state): State<AppState>,
    user: Option<Extension<SessionUser>>,
    Form(form): Form<NewProjectForm>,
) -> PageResult {
    let Some(Extension(user)) = user else {
        return render(
            &state,
            ProjectsPage {
                user: None,
                projects: vec![],
                client_options: vec![],
                filter: ProjectFilter::All,
                form,
                show_form: true,
                error: Some("You must be logged in".to_string()),
                status: StatusCode::UNAUTHORIZED,
            },
        );
    };

    let workspace = state.workspace(user.clone());
    let err = match workspace.create_project(form.clone()).await {
        Ok(_) => return Ok(Redirect::to("/projects").into_response()),
        Err(err) => ApiError::from(err),
    };

    let (projects, client_options) = load(&workspace)
        .await
        .map_err(|e| state.page_error(Some(&user), e))?;
    render(
        &state,
        ProjectsPage {
            user: Some(&user),
            projects,
            client_options,
            filter: ProjectFilter::All,
            form,
            show_form: true,
            error: Some(err.message().to_string()),
            status: err.status(),
        },
    )
}

/// GET /projects/:id
pub async fn show(
    State(state): State<AppState>,
    user: Option<Extension<SessionUser>>,
    Path(id): Path<String>,
) -> PageResult {
    let Some(Extension(user)) = user else {
        return Ok(to_login());
    };
    let id = parse_id(&id, "Project").map_err(|e| state.page_error(Some(&user), e))?;
    let detail = state
        .workspace(user.clone())
        .project(id)
        .await
        .map_err(|e| state.page_error(Some(&user), e))?;

    render_detail(&state, &user, detail, "", None)
}

/// Renders the project page, optionally with a task error and the rejected title.
pub(crate) fn render_detail(
    state: &AppState,
    user: &SessionUser,
    detail: ProjectDetail,
    task_title: &str,
    error: Option<ApiError>,
) -> PageResult {
    let status = error.as_ref().map(|e| e.status()).unwrap_or(StatusCode::OK);
    let ProjectDetail { project, tasks } = detail;

    let mut context = page_context(Some(user));
    context.insert("project", &project);
    context.insert("buckets", &TaskBuckets::partition(tasks));
    context.insert("task_title", task_title);
    context.insert("error", &error.as_ref().map(|e| e.message()));
    state.render_page("project_detail.html", &context, status)
}
