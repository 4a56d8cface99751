use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::app::AppState;
use crate::database::models::SessionUser;
use crate::error::ApiError;

/// Resolves the session user for this request and stores it in the request
/// extensions. Requests without a valid session pass through anonymous.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(request.headers(), &jar, &state.security.session_cookie) {
        match state.identity.current_user(&token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(user);
            }
            Ok(None) => {}
            Err(err) => warn!("Session lookup failed: {}", err),
        }
    }

    next.run(request).await
}

/// Rejects API requests that carry no session with 401.
pub async fn require_user_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    if request.extensions().get::<SessionUser>().is_none() {
        return Err(ApiError::unauthorized("Authentication required"));
    }
    Ok(next.run(request).await)
}

/// Bearer token from the Authorization header, else the session cookie.
pub fn extract_token(headers: &HeaderMap, jar: &CookieJar, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match bearer {
        Some(token) => Some(token.to_string()),
        None => jar
            .get(cookie_name)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty()),
    }
}
