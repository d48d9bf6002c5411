#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{
        Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use time::OffsetDateTime;
use tower::ServiceExt;
use yatube_api::server::{ServerState, app};
use yatube_common::model::{
    auth::Authentication,
    group::{CreateGroup, Group},
    user::{CreateUser, User, Username},
};
use yatube_db::{memory::MemoryStore, store::Store};

/// The whole router on top of a fresh in-memory store.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
}

pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let router = app(ServerState {
            store: store.clone(),
        });

        Self { router, store }
    }

    pub async fn user(&self, username: &str) -> TestUser {
        self.create_user(username, false).await
    }

    pub async fn superuser(&self, username: &str) -> TestUser {
        self.create_user(username, true).await
    }

    async fn create_user(&self, username: &str, is_superuser: bool) -> TestUser {
        let user = self
            .store
            .create_user(&CreateUser {
                username: Username::new(username.to_owned()).unwrap(),
                is_superuser,
            })
            .await
            .unwrap();

        let (token, authentication) =
            Authentication::issue(user.id, OffsetDateTime::now_utc(), None).unwrap();
        self.store
            .create_authentication(&authentication)
            .await
            .unwrap();

        TestUser {
            user,
            token: token.to_bearer(),
        }
    }

    pub async fn group(&self, slug: &str) -> Group {
        self.store
            .create_group(&CreateGroup {
                title: format!("Group {slug}"),
                slug: slug.to_owned(),
                description: format!("All about {slug}"),
            })
            .await
            .unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    pub async fn get(&self, path: &str, user: Option<&TestUser>) -> (StatusCode, Value) {
        self.send(Method::GET, path, token(user), None).await
    }

    pub async fn post(&self, path: &str, user: Option<&TestUser>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, path, token(user), Some(body)).await
    }

    pub async fn put(&self, path: &str, user: Option<&TestUser>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, path, token(user), Some(body)).await
    }

    pub async fn patch(&self, path: &str, user: Option<&TestUser>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, path, token(user), Some(body)).await
    }

    pub async fn delete(&self, path: &str, user: Option<&TestUser>) -> (StatusCode, Value) {
        self.send(Method::DELETE, path, token(user), None).await
    }
}

fn token(user: Option<&TestUser>) -> Option<&str> {
    user.map(|user| user.token.as_str())
}
