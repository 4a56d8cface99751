mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{add_task, api_get, api_post, api_send, create_client, create_project, sign_up, test_app};

async fn project_for(app: &axum::Router, token: &str) -> String {
    let client_id = create_client(app, token, "Taskers").await;
    create_project(app, token, &client_id, "Launch", "active").await
}

#[tokio::test]
async fn new_tasks_start_as_todo() {
    let app = test_app();
    let owner = sign_up(&app, "tasks@agency.test").await;
    let project_id = project_for(&app, &owner.token).await;

    let res = api_post(
        &app,
        &format!("/api/projects/{}/tasks", project_id),
        Some(&owner.token),
        json!({ "title": "  Draft copy  ", "status": "done" }),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let task = res.data();
    assert_eq!(task["title"], "Draft copy");
    assert_eq!(task["status"], "todo");
    assert_eq!(task["priority"], "medium");
    assert!(task["completed_at"].is_null());
    assert!(task["assigned_to"].is_null());
    assert_eq!(task["project_id"], project_id.as_str());

    let blank = api_post(
        &app,
        &format!("/api/projects/{}/tasks", project_id),
        Some(&owner.token),
        json!({ "title": "   " }),
    )
    .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert_eq!(blank.json()["message"], "Task title is required");
}

#[tokio::test]
async fn toggle_stamps_and_clears_completion() {
    let app = test_app();
    let owner = sign_up(&app, "toggle@agency.test").await;
    let project_id = project_for(&app, &owner.token).await;
    let task_id = add_task(&app, &owner.token, &project_id, "Review").await;

    let done = api_post(&app, &format!("/api/tasks/{}/toggle", task_id), Some(&owner.token), json!({})).await;
    assert_eq!(done.status, StatusCode::OK, "{}", done.body);
    assert_eq!(done.data()["status"], "done");
    assert!(done.data()["completed_at"].is_string());

    let reopened = api_post(&app, &format!("/api/tasks/{}/toggle", task_id), Some(&owner.token), json!({})).await;
    assert_eq!(reopened.status, StatusCode::OK);
    assert_eq!(reopened.data()["status"], "todo");
    assert!(reopened.data()["completed_at"].is_null());
}

#[tokio::test]
async fn delete_requires_confirmation() {
    let app = test_app();
    let owner = sign_up(&app, "delete@agency.test").await;
    let project_id = project_for(&app, &owner.token).await;
    let task_id = add_task(&app, &owner.token, &project_id, "Obsolete").await;
    let tasks_uri = format!("/api/projects/{}/tasks", project_id);

    let unconfirmed = api_send(&app, Method::DELETE, &format!("/api/tasks/{}", task_id), Some(&owner.token), json!({})).await;
    assert_eq!(unconfirmed.status, StatusCode::BAD_REQUEST);
    let still_there = api_get(&app, &tasks_uri, Some(&owner.token)).await;
    assert_eq!(still_there.data().as_array().unwrap().len(), 1);

    let confirmed = api_send(
        &app,
        Method::DELETE,
        &format!("/api/tasks/{}?confirm=true", task_id),
        Some(&owner.token),
        json!({}),
    )
    .await;
    assert_eq!(confirmed.status, StatusCode::OK, "{}", confirmed.body);
    assert_eq!(confirmed.data()["id"], task_id.as_str());

    let gone = api_get(&app, &tasks_uri, Some(&owner.token)).await;
    assert_eq!(gone.data(), json!([]));

    let again = api_send(
        &app,
        Method::DELETE,
        &format!("/api/tasks/{}?confirm=true", task_id),
        Some(&owner.token),
        json!({}),
    )
    .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tasks_of_other_users_are_untouchable() {
    let app = test_app();
    let alice = sign_up(&app, "alice.t@agency.test").await;
    let bob = sign_up(&app, "bob.t@agency.test").await;
    let project_id = project_for(&app, &alice.token).await;
    let task_id = add_task(&app, &alice.token, &project_id, "Private").await;

    let list = api_get(&app, &format!("/api/projects/{}/tasks", project_id), Some(&bob.token)).await;
    assert_eq!(list.status, StatusCode::NOT_FOUND);

    let add = api_post(
        &app,
        &format!("/api/projects/{}/tasks", project_id),
        Some(&bob.token),
        json!({ "title": "Sneaky" }),
    )
    .await;
    assert_eq!(add.status, StatusCode::NOT_FOUND);

    let toggle = api_post(&app, &format!("/api/tasks/{}/toggle", task_id), Some(&bob.token), json!({})).await;
    assert_eq!(toggle.status, StatusCode::NOT_FOUND);

    let delete = api_send(
        &app,
        Method::DELETE,
        &format!("/api/tasks/{}?confirm=true", task_id),
        Some(&bob.token),
        json!({}),
    )
    .await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    let detail = api_get(&app, &format!("/api/projects/{}", project_id), Some(&alice.token)).await;
    let tasks = detail.data()["tasks"].clone();
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["status"], "todo");
}
