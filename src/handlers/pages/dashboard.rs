use axum::{extract::State, http::StatusCode, Extension};

use super::{page_context, to_login, PageResult};
use crate::app::AppState;
use crate::database::models::SessionUser;

/// GET /dashboard
pub async fn show(State(state): State<AppState>, user: Option<Extension<SessionUser>>) -> PageResult {
    let Some(Extension(user)) = user else {
        return Ok(to_login());
    };

    let counts = state
        .workspace(user.clone())
        .dashboard()
        .await
        .map_err(|e| state.page_error(Some(&user), e))?;

    let mut context = page_context(Some(&user));
    context.insert("counts", &counts);
    state.render_page("dashboard.html", &context, StatusCode::OK)
}
