use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Extension, Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::{page_context, PageResult};
use crate::app::AppState;
use crate::auth::{IdentityError, Session};
use crate::config::SecurityConfig;
use crate::database::models::SessionUser;
use crate::error::ApiError;
use crate::forms::CredentialsForm;

#[derive(Clone, Copy)]
enum Mode {
    Login,
    Signup,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Mode::Login => "login",
            Mode::Signup => "signup",
        }
    }
}

pub(crate) fn session_cookie(security: &SecurityConfig, token: String) -> Cookie<'static> {
    Cookie::build((security.session_cookie.clone(), token))
        .path("/")
        .http_only(true)
        .secure(security.secure_cookies)
        .same_site(SameSite::Lax)
        .build()
}

pub(crate) fn clear_session(security: &SecurityConfig, jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((security.session_cookie.clone(), "")).path("/").build())
}

fn render_auth(state: &AppState, mode: Mode, email: &str, error: Option<&str>, status: StatusCode) -> PageResult {
    let mut context = page_context(None);
    context.insert("mode", mode.as_str());
    context.insert("email", email);
    context.insert("error", &error);
    state.render_page("auth.html", &context, status)
}

/// GET / - landing page, or straight to the dashboard when signed in
pub async fn landing(State(state): State<AppState>, user: Option<Extension<SessionUser>>) -> PageResult {
    if user.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    state.render_page("landing.html", &page_context(None), StatusCode::OK)
}

pub async fn login_form(State(state): State<AppState>, user: Option<Extension<SessionUser>>) -> PageResult {
    if user.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    render_auth(&state, Mode::Login, "", None, StatusCode::OK)
}

pub async fn signup_form(State(state): State<AppState>, user: Option<Extension<SessionUser>>) -> PageResult {
    if user.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    render_auth(&state, Mode::Signup, "", None, StatusCode::OK)
}

pub async fn login(State(state): State<AppState>, jar: CookieJar, Form(form): Form<CredentialsForm>) -> PageResult {
    let email = form.email.clone();
    let result = state.identity.sign_in(form).await;
    finish(&state, jar, Mode::Login, &email, result)
}

pub async fn signup(State(state): State<AppState>, jar: CookieJar, Form(form): Form<CredentialsForm>) -> PageResult {
    let email = form.email.clone();
    let result = state.identity.sign_up(form).await;
    finish(&state, jar, Mode::Signup, &email, result)
}

fn finish(
    state: &AppState,
    jar: CookieJar,
    mode: Mode,
    email: &str,
    result: Result<Session, IdentityError>,
) -> PageResult {
    match result {
        Ok(session) => {
            let jar = jar.add(session_cookie(&state.security, session.token));
            Ok((jar, Redirect::to("/dashboard")).into_response())
        }
        Err(err) => {
            let err = ApiError::from(err);
            render_auth(state, mode, email, Some(err.message()), err.status())
        }
    }
}

/// POST /logout - drops the session cookie
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    (clear_session(&state.security, jar), Redirect::to("/"))
}
