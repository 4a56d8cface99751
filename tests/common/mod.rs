#![allow(dead_code)]

use std::sync::{Arc, Once};

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use agency_os::config::AppConfig;
use agency_os::database::MemoryStore;
use agency_os::{router, AppState};

pub const PASSWORD: &str = "correct-horse";

static TRACING: Once = Once::new();

/// Opt-in log output: `TEST_LOG=1 cargo test`.
pub fn init_test_tracing() {
    if std::env::var("TEST_LOG").is_err() {
        return;
    }
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("agency_os=debug"))
            .with_test_writer()
            .try_init();
    });
}

/// A fresh app over its own in-memory store.
pub fn test_app() -> Router {
    init_test_tracing();
    let mut config = AppConfig::development();
    config.api.enable_request_logging = false;
    let state = AppState::new(Arc::new(MemoryStore::new()), &config).expect("templates load");
    router(state)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|e| panic!("not JSON ({}): {}", e, self.body))
    }

    pub fn data(&self) -> Value {
        self.json()["data"].clone()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
    }

    /// `name=value` of the first Set-Cookie header.
    pub fn session_cookie(&self) -> Option<String> {
        let raw = self.headers.get(header::SET_COOKIE)?.to_str().ok()?;
        raw.split(';').next().map(|pair| pair.trim().to_string())
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    TestResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

fn with_bearer(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

fn with_cookie(builder: axum::http::request::Builder, cookie: Option<&str>) -> axum::http::request::Builder {
    match cookie {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}

pub async fn api_get(app: &Router, uri: &str, token: Option<&str>) -> TestResponse {
    let request = with_bearer(Request::builder().method(Method::GET).uri(uri), token)
        .body(Body::empty())
        .expect("request");
    send(app, request).await
}

pub async fn api_send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
    let request = with_bearer(Request::builder().method(method).uri(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    send(app, request).await
}

pub async fn api_post(app: &Router, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
    api_send(app, Method::POST, uri, token, body).await
}

pub async fn page_get(app: &Router, uri: &str, cookie: Option<&str>) -> TestResponse {
    let request = with_cookie(Request::builder().method(Method::GET).uri(uri), cookie)
        .body(Body::empty())
        .expect("request");
    send(app, request).await
}

/// Submits a urlencoded form, e.g. `"company=Acme&status=lead"`.
pub async fn page_post(app: &Router, uri: &str, cookie: Option<&str>, form: &str) -> TestResponse {
    let request = with_cookie(Request::builder().method(Method::POST).uri(uri), cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .expect("request");
    send(app, request).await
}

pub struct SignedIn {
    pub token: String,
    pub cookie: String,
    pub user_id: String,
}

pub async fn sign_up(app: &Router, email: &str) -> SignedIn {
    let res = api_post(app, "/auth/signup", None, json!({ "email": email, "password": PASSWORD })).await;
    assert_eq!(res.status, StatusCode::CREATED, "signup failed: {}", res.body);
    let cookie = res.session_cookie().expect("session cookie");
    let data = res.data();
    SignedIn {
        token: data["token"].as_str().expect("token").to_string(),
        user_id: data["user"]["id"].as_str().expect("user id").to_string(),
        cookie,
    }
}

pub async fn create_client(app: &Router, token: &str, company: &str) -> String {
    let res = api_post(
        app,
        "/api/clients",
        Some(token),
        json!({ "company": company, "name": "Jordan", "status": "active" }),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "client create failed: {}", res.body);
    res.data()["id"].as_str().expect("client id").to_string()
}

pub async fn create_project(app: &Router, token: &str, client_id: &str, name: &str, status: &str) -> String {
    let res = api_post(
        app,
        "/api/projects",
        Some(token),
        json!({ "client_id": client_id, "name": name, "status": status }),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "project create failed: {}", res.body);
    res.data()["id"].as_str().expect("project id").to_string()
}

pub async fn add_task(app: &Router, token: &str, project_id: &str, title: &str) -> String {
    let res = api_post(
        app,
        &format!("/api/projects/{}/tasks", project_id),
        Some(token),
        json!({ "title": title }),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "task create failed: {}", res.body);
    res.data()["id"].as_str().expect("task id").to_string()
}
