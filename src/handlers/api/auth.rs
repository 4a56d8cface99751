// handlers/api/auth.rs - session endpoints for API clients

use axum::{extract::State, Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::Session;
use crate::database::models::SessionUser;
use crate::forms::CredentialsForm;
use crate::handlers::pages::auth::{clear_session, session_cookie};
use crate::middleware::{ApiResponse, ApiResult};

/**
 * POST /auth/signup - create an account and start a session
 *
 * Input: `{"email": "...", "password": "..."}`
 * Output: `{"success": true, "data": {"token": "...", "user": {"id", "email"}}}`
 */
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(form): Json<CredentialsForm>,
) -> Result<(CookieJar, ApiResponse<Session>), crate::error::ApiError> {
    let session = state.identity.sign_up(form).await?;
    let jar = jar.add(session_cookie(&state.security, session.token.clone()));
    Ok((jar, ApiResponse::created(session)))
}

/// POST /auth/login - same payload and response as signup
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(form): Json<CredentialsForm>,
) -> Result<(CookieJar, ApiResponse<Session>), crate::error::ApiError> {
    let session = state.identity.sign_in(form).await?;
    let jar = jar.add(session_cookie(&state.security, session.token.clone()));
    Ok((jar, ApiResponse::success(session)))
}

/// POST /auth/logout
///
/// Tokens are stateless; this only clears the session cookie.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, ApiResponse<Value>) {
    (
        clear_session(&state.security, jar),
        ApiResponse::success(json!({ "signed_out": true })),
    )
}

/// GET /api/auth/whoami
pub async fn whoami(Extension(user): Extension<SessionUser>) -> ApiResult<SessionUser> {
    Ok(ApiResponse::success(user))
}
