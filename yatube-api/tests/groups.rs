mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn anyone_can_read_groups() {
    let app = TestApp::new();
    let cats = app.group("cats").await;
    app.group("dogs").await;

    let (status, body) = app.get("/groups/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["slug"], "cats");
    assert_eq!(body[1]["slug"], "dogs");

    let (status, body) = app.get(&format!("/groups/{}/", cats.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "id": cats.id.get(),
            "title": "Group cats",
            "slug": "cats",
            "description": "All about cats",
        })
    );
}

#[tokio::test]
async fn missing_group() {
    let app = TestApp::new();

    let (status, body) = app.get("/groups/42/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);

    let (status, _) = app.get("/groups/not-a-number/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn groups_are_read_only() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let group = app.group("cats").await;

    let (status, _) = app
        .post("/groups/", Some(&alice), json!({"title": "x", "slug": "x", "description": "x"}))
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, body) = app
        .send(Method::DELETE, &format!("/groups/{}/", group.id), Some(&alice.token), None)
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["status"], 405);
}

#[tokio::test]
async fn unknown_route() {
    let app = TestApp::new();

    let (status, body) = app.get("/nothing/here/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}
