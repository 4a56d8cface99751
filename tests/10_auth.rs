mod common;

use axum::http::{header, StatusCode};
use serde_json::json;

use common::{api_get, api_post, sign_up, test_app, PASSWORD};

#[tokio::test]
async fn health_endpoint_responds() {
    let app = test_app();
    let res = api_get(&app, "/health", None).await;

    assert_eq!(res.status, StatusCode::OK);
    let data = res.data();
    assert_eq!(data["status"], "ok");
    assert_eq!(data["database"], "ok");
    assert!(data["timestamp"].is_string());
}

#[tokio::test]
async fn signup_returns_token_and_sets_cookie() {
    let app = test_app();
    let res = api_post(
        &app,
        "/auth/signup",
        None,
        json!({ "email": "  Owner@Agency.test ", "password": PASSWORD }),
    )
    .await;

    assert_eq!(res.status, StatusCode::CREATED);
    let data = res.data();
    assert!(data["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(data["user"]["email"], "owner@agency.test");

    let set_cookie = res.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("agency_session="));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn whoami_resolves_bearer_token() {
    let app = test_app();
    let owner = sign_up(&app, "whoami@agency.test").await;

    let res = api_get(&app, "/api/auth/whoami", Some(&owner.token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["email"], "whoami@agency.test");
    assert_eq!(res.data()["id"], owner.user_id.as_str());
}

#[tokio::test]
async fn login_checks_password() {
    let app = test_app();
    sign_up(&app, "login@agency.test").await;

    let ok = api_post(
        &app,
        "/auth/login",
        None,
        json!({ "email": "LOGIN@agency.test", "password": PASSWORD }),
    )
    .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.session_cookie().is_some());

    let wrong = api_post(
        &app,
        "/auth/login",
        None,
        json!({ "email": "login@agency.test", "password": "not-the-password" }),
    )
    .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.json()["code"], "UNAUTHORIZED");

    let unknown = api_post(
        &app,
        "/auth/login",
        None,
        json!({ "email": "nobody@agency.test", "password": PASSWORD }),
    )
    .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_rejects_duplicates_and_bad_input() {
    let app = test_app();
    sign_up(&app, "taken@agency.test").await;

    let dup = api_post(
        &app,
        "/auth/signup",
        None,
        json!({ "email": "taken@agency.test", "password": PASSWORD }),
    )
    .await;
    assert_eq!(dup.status, StatusCode::CONFLICT);

    let weak = api_post(
        &app,
        "/auth/signup",
        None,
        json!({ "email": "weak@agency.test", "password": "abc" }),
    )
    .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);

    let bad_email = api_post(
        &app,
        "/auth/signup",
        None,
        json!({ "email": "not-an-email", "password": PASSWORD }),
    )
    .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn api_requires_a_session() {
    let app = test_app();

    for uri in ["/api/dashboard", "/api/clients", "/api/projects", "/api/auth/whoami"] {
        let res = api_get(&app, uri, None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{} should require a session", uri);
        assert_eq!(res.json()["error"], true);
    }

    let forged = api_get(&app, "/api/clients", Some("not.a.jwt")).await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let app = test_app();
    let res = api_post(&app, "/auth/logout", None, json!({})).await;

    assert_eq!(res.status, StatusCode::OK);
    let set_cookie = res.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("agency_session="));
    assert!(set_cookie.contains("Max-Age=0"));
}
