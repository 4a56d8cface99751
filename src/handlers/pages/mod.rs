//! Server-rendered pages. Every mutation answers with a 303 so the browser
//! reloads the affected page from the store.

pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod projects;
pub mod tasks;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tera::Context;

use crate::app::AppState;
use crate::database::models::SessionUser;
use crate::error::ApiError;

/// A fully rendered error page.
pub struct PageError(Response);

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        self.0
    }
}

pub type PageResult = Result<Response, PageError>;

pub(crate) fn to_login() -> Response {
    Redirect::to("/login").into_response()
}

pub(crate) fn page_context(user: Option<&SessionUser>) -> Context {
    let mut context = Context::new();
    context.insert("user", &user);
    context
}

impl AppState {
    pub(crate) fn render_page(&self, name: &str, context: &Context, status: StatusCode) -> PageResult {
        match self.templates.render(name, context) {
            Ok(html) => Ok((status, html).into_response()),
            Err(err) => {
                tracing::error!("Failed to render {}: {:?}", name, err);
                Err(self.page_error(None, ApiError::internal_server_error("Failed to render page")))
            }
        }
    }

    pub(crate) fn page_error(&self, user: Option<&SessionUser>, err: impl Into<ApiError>) -> PageError {
        let err = err.into();
        let html = self.templates.render_error(err.status_code(), err.message(), user);
        PageError((err.status(), html).into_response())
    }
}
