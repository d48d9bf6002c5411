mod common;

use axum::http::StatusCode;
use common::{TestApp, TestUser};
use serde_json::{Value, json};

async fn post_by(app: &TestApp, author: &TestUser, text: &str) -> Value {
    let (status, post) = app.post("/posts/", Some(author), json!({"text": text})).await;
    assert_eq!(status, StatusCode::CREATED);
    post
}

#[tokio::test]
async fn comments_of_a_missing_post() {
    let app = TestApp::new();
    let alice = app.user("alice").await;

    let (status, _) = app.get("/posts/999/comments/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .post("/posts/999/comments/", Some(&alice), json!({"text": "hi"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.post("/posts/999/comments/", None, json!({"text": "hi"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_and_author_come_from_the_request() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let post = post_by(&app, &alice, "first").await;
    let other = post_by(&app, &alice, "second").await;

    let (status, comment) = app
        .post(
            &format!("/posts/{}/comments/", post["id"]),
            Some(&bob),
            json!({"text": "nice", "post": other["id"], "author": "alice"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["author"], "bob");
    assert_eq!(comment["post"], post["id"]);
    assert_eq!(comment["text"], "nice");

    let (_, comments) = app
        .get(&format!("/posts/{}/comments/", post["id"]), None)
        .await;
    assert_eq!(comments.as_array().unwrap().len(), 1);
    let (_, comments) = app
        .get(&format!("/posts/{}/comments/", other["id"]), None)
        .await;
    assert_eq!(comments, json!([]));

    let (status, _) = app
        .get(
            &format!("/posts/{}/comments/{}/", other["id"], comment["id"]),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .get(
            &format!("/posts/{}/comments/{}/", post["id"], comment["id"]),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, comment);
}

#[tokio::test]
async fn only_comment_author_or_superuser_may_write() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let admin = app.superuser("admin").await;
    let post = post_by(&app, &alice, "first").await;

    let (_, comment) = app
        .post(
            &format!("/posts/{}/comments/", post["id"]),
            Some(&bob),
            json!({"text": "nice"}),
        )
        .await;
    let path = format!("/posts/{}/comments/{}/", post["id"], comment["id"]);

    let (status, _) = app.patch(&path, Some(&alice), json!({"text": "rude"})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&path, Some(&alice)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.patch(&path, None, json!({"text": "rude"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.put(&path, Some(&bob), json!({"text": "very nice"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "very nice");
    assert_eq!(body["author"], "bob");

    let (status, _) = app.patch(&path, Some(&bob), json!({"text": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.delete(&path, Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&path, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn existence_and_permission_come_before_the_body() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let post = post_by(&app, &alice, "first").await;

    let (_, comment) = app
        .post(
            &format!("/posts/{}/comments/", post["id"]),
            Some(&alice),
            json!({"text": "mine"}),
        )
        .await;
    let path = format!("/posts/{}/comments/{}/", post["id"], comment["id"]);

    let (status, _) = app.patch(&path, Some(&bob), json!({"text": ""})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.put(&path, Some(&bob), json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let missing = format!("/posts/{}/comments/999/", post["id"]);
    let (status, _) = app.put(&missing, Some(&alice), json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.patch(&missing, Some(&alice), json!({"text": ""})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.put("/posts/999/comments/1/", Some(&alice), json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.put(&path, Some(&alice), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_a_post_removes_its_comments() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let post = post_by(&app, &alice, "first").await;
    let comments = format!("/posts/{}/comments/", post["id"]);

    let (status, _) = app.post(&comments, Some(&alice), json!({"text": "me"})).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .delete(&format!("/posts/{}/", post["id"]), Some(&alice))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&comments, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
