//! Shared harness: the real router over a private in-memory database

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use common::database::{DatabaseConfig, init_pool, run_migrations};
use finance_api::{
    AppConfig, AppState, app, jwt::JwtConfig, passwords::HashingConfig,
};

pub const ADMIN_PASSWORD: &str = "admin123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub async fn spawn() -> TestApp {
    let pool = init_pool(&DatabaseConfig::in_memory()).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let config = AppConfig {
        bind_address: "127.0.0.1:0".to_string(),
        database: DatabaseConfig::in_memory(),
        jwt: JwtConfig {
            secret_key: "integration-secret".to_string(),
            access_token_expiry: 3600,
            invite_token_expiry: 3600,
        },
        hashing: HashingConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        },
        admin_default_password: ADMIN_PASSWORD.to_string(),
        public_url: "http://localhost:8000".to_string(),
    };

    let state = AppState::new(pool, Arc::new(config)).unwrap();
    state
        .identity
        .ensure_default_admin(ADMIN_PASSWORD)
        .await
        .unwrap();

    TestApp {
        router: app(state.clone()),
        state,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("username={username}&password={password}")))
            .unwrap();
        self.send(request).await
    }

    pub async fn token_for(&self, username: &str, password: &str) -> String {
        let (status, body) = self.login(username, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.token_for("admin", ADMIN_PASSWORD).await
    }

    /// Self-register an independent account and return its id and token
    pub async fn register(&self, username: &str) -> (i64, String) {
        let (status, body) = self
            .call(
                Method::POST,
                "/auth/register",
                None,
                Some(serde_json::json!({ "username": username, "password": "pass1234" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        let id = body["id"].as_i64().unwrap();
        (id, self.token_for(username, "pass1234").await)
    }

    /// Invite and register a dependent under the owner of `parent_token`
    pub async fn add_dependent(&self, parent_token: &str, username: &str) -> (i64, String) {
        let (status, invite) = self.call(Method::POST, "/invite", Some(parent_token), None).await;
        assert_eq!(status, StatusCode::OK, "invite failed: {invite}");

        let (status, body) = self
            .call(
                Method::POST,
                "/register-dependent",
                None,
                Some(serde_json::json!({
                    "token": invite["invite_token"],
                    "username": username,
                    "password": "pass1234",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register-dependent failed: {body}");
        (
            body["user"]["id"].as_i64().unwrap(),
            body["access_token"].as_str().unwrap().to_string(),
        )
    }
}
