mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{api_get, api_post, create_client, create_project, sign_up, test_app};

fn names(list: &serde_json::Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn create_project_with_budget_and_dates() {
    let app = test_app();
    let owner = sign_up(&app, "projects@agency.test").await;
    let client_id = create_client(&app, &owner.token, "Acme").await;

    let res = api_post(
        &app,
        "/api/projects",
        Some(&owner.token),
        json!({
            "client_id": client_id,
            "name": "Rebrand",
            "description": "Logo and site refresh",
            "status": "planning",
            "start_date": "2024-03-01",
            "due_date": "2024-06-30",
            "budget": 1000
        }),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let project = res.data();
    assert_eq!(project["name"], "Rebrand");
    assert_eq!(project["status"], "planning");
    assert_eq!(project["budget"], json!(1000.0));
    assert_eq!(project["start_date"], "2024-03-01");
    assert_eq!(project["due_date"], "2024-06-30");

    // Budget also arrives as text from forms
    let text = api_post(
        &app,
        "/api/projects",
        Some(&owner.token),
        json!({ "client_id": client_id, "name": "Retainer", "budget": "2500.50" }),
    )
    .await;
    assert_eq!(text.status, StatusCode::CREATED, "{}", text.body);
    assert_eq!(text.data()["budget"], json!(2500.5));
    assert_eq!(text.data()["status"], "planning");
}

#[tokio::test]
async fn list_includes_client_summary() {
    let app = test_app();
    let owner = sign_up(&app, "joined@agency.test").await;
    let client_id = create_client(&app, &owner.token, "Joined Inc").await;
    create_project(&app, &owner.token, &client_id, "Site", "active").await;

    let res = api_get(&app, "/api/projects", Some(&owner.token)).await;
    assert_eq!(res.status, StatusCode::OK);
    let first = &res.data()[0];
    assert_eq!(first["name"], "Site");
    assert_eq!(first["client"]["company"], "Joined Inc");
    assert_eq!(first["client"]["id"], client_id.as_str());
}

#[tokio::test]
async fn invalid_project_input_is_rejected() {
    let app = test_app();
    let owner = sign_up(&app, "invalid@agency.test").await;
    let client_id = create_client(&app, &owner.token, "Acme").await;

    let cases = [
        json!({ "client_id": client_id, "name": "Negative", "budget": -10 }),
        json!({ "client_id": client_id, "name": "Words", "budget": "lots" }),
        json!({ "client_id": client_id, "name": "" }),
        json!({ "client_id": "", "name": "No client" }),
        json!({ "client_id": client_id, "name": "Dates", "due_date": "30/06/2024" }),
        json!({ "client_id": client_id, "name": "Status", "status": "paused" }),
    ];
    for body in cases {
        let res = api_post(&app, "/api/projects", Some(&owner.token), body.clone()).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{} -> {}", body, res.body);
    }

    let list = api_get(&app, "/api/projects", Some(&owner.token)).await;
    assert_eq!(list.data().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn projects_cannot_reference_another_users_client() {
    let app = test_app();
    let alice = sign_up(&app, "alice.p@agency.test").await;
    let bob = sign_up(&app, "bob.p@agency.test").await;
    let alices_client = create_client(&app, &alice.token, "Alice Co").await;

    let res = api_post(
        &app,
        "/api/projects",
        Some(&bob.token),
        json!({ "client_id": alices_client, "name": "Hijack" }),
    )
    .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY, "{}", res.body);
    assert_eq!(res.json()["code"], "REJECTED");
}

#[tokio::test]
async fn other_users_projects_are_not_found() {
    let app = test_app();
    let alice = sign_up(&app, "alice.s@agency.test").await;
    let bob = sign_up(&app, "bob.s@agency.test").await;
    let client_id = create_client(&app, &alice.token, "Private").await;
    let project_id = create_project(&app, &alice.token, &client_id, "Secret", "active").await;

    let own = api_get(&app, &format!("/api/projects/{}", project_id), Some(&alice.token)).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.data()["name"], "Secret");
    assert_eq!(own.data()["tasks"], json!([]));

    let foreign = api_get(&app, &format!("/api/projects/{}", project_id), Some(&bob.token)).await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);

    let malformed = api_get(&app, "/api/projects/not-a-uuid", Some(&alice.token)).await;
    assert_eq!(malformed.status, StatusCode::NOT_FOUND);

    let bobs = api_get(&app, "/api/projects", Some(&bob.token)).await;
    assert_eq!(bobs.data().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn status_filter_narrows_the_list() {
    let app = test_app();
    let owner = sign_up(&app, "filter@agency.test").await;
    let client_id = create_client(&app, &owner.token, "Filtered").await;
    create_project(&app, &owner.token, &client_id, "Planned", "planning").await;
    create_project(&app, &owner.token, &client_id, "Running", "active").await;
    create_project(&app, &owner.token, &client_id, "Shipped", "completed").await;

    let all = api_get(&app, "/api/projects", Some(&owner.token)).await;
    assert_eq!(names(&all.data()), vec!["Shipped", "Running", "Planned"]);

    let active = api_get(&app, "/api/projects?status=active", Some(&owner.token)).await;
    assert_eq!(names(&active.data()), vec!["Running"]);

    let completed = api_get(&app, "/api/projects?status=completed", Some(&owner.token)).await;
    assert_eq!(names(&completed.data()), vec!["Shipped"]);

    let unknown = api_get(&app, "/api/projects?status=whatever", Some(&owner.token)).await;
    assert_eq!(names(&unknown.data()).len(), 3);
}
