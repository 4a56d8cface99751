use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Extension, Form,
};

use super::{page_context, to_login, PageResult};
use crate::app::AppState;
use crate::database::models::{Client, ClientStatus, SessionUser};
use crate::error::ApiError;
use crate::forms::NewClientForm;

struct ClientsPage<'a> {
    user: Option<&'a SessionUser>,
    clients: Vec<Client>,
    form: NewClientForm,
    show_form: bool,
    error: Option<String>,
    status: StatusCode,
}

fn render(state: &AppState, page: ClientsPage<'_>) -> PageResult {
    let mut form = page.form;
    if form.status.is_empty() {
        form.status = ClientStatus::default().to_string();
    }
    let statuses: Vec<&str> = ClientStatus::ALL.iter().map(|s| s.as_str()).collect();

    let mut context = page_context(page.user);
    context.insert("clients", &page.clients);
    context.insert("form", &form);
    context.insert("statuses", &statuses);
    context.insert("show_form", &page.show_form);
    context.insert("error", &page.error);
    state.render_page("clients.html", &context, page.status)
}

/// GET /clients
pub async fn index(State(state): State<AppState>, user: Option<Extension<SessionUser>>) -> PageResult {
    let Some(Extension(user)) = user else {
        return Ok(to_login());
    };
    let clients = state
        .workspace(user.clone())
        .clients()
        .await
        .map_err(|e| state.page_error(Some(&user), e))?;

    render(
        &state,
        ClientsPage {
            user: Some(&user),
            clients,
            form: NewClientForm::default(),
            show_form: false,
            error: None,
            status: StatusCode::OK,
        },
    )
}

/// POST /clients - create, then reload the list; on failure the form stays open with its values
pub async fn create(
    State(state): State<AppState>,
    user: Option<Extension<SessionUser>>,
    Form(form): Form<NewClientForm>,
) -> PageResult {
    let Some(Extension(user)) = user else {
        return render(
            &state,
            ClientsPage {
                user: None,
                clients: vec![],
                form,
                show_form: true,
                error: Some("You must be logged in to create a client".to_string()),
                status: StatusCode::UNAUTHORIZED,
            },
        );
    };

    let workspace = state.workspace(user.clone());
    let err = match workspace.create_client(form.clone()).await {
        Ok(_) => return Ok(Redirect::to("/clients").into_response()),
        Err(err) => ApiError::from(err),
    };

    let clients = workspace
        .clients()
        .await
        .map_err(|e| state.page_error(Some(&user), e))?;
    render(
        &state,
        ClientsPage {
            user: Some(&user),
            clients,
            form,
            show_form: true,
            error: Some(err.message().to_string()),
            status: err.status(),
        },
    )
}
