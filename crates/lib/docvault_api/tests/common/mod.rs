//! Shared helpers for router-level tests: in-memory stores, a temporary
//! upload directory, and request builders.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use axum::http::{Request, Response, StatusCode};
use docvault_api::config::{ApiConfig, Environment};
use docvault_api::{AppState, router};
use docvault_core::store::Stores;
use docvault_core::store::memory::MemoryStore;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "docvault-test-boundary";

/// A router over fresh in-memory stores. Keep the `TempDir` alive for the
/// duration of the test.
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    /// The backend behind `state.stores`, for inspecting stored records.
    pub memory: Arc<MemoryStore>,
    pub uploads: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_environment(Environment::Production)
    }

    pub fn with_environment(environment: Environment) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("docvault_api=debug,docvault_core=debug")
            .with_test_writer()
            .try_init();
        let uploads = tempfile::tempdir().expect("tempdir");
        let config = ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            database_url: "postgres://unused".into(),
            jwt_secret: "test-secret".into(),
            environment,
            upload_dir: uploads.path().join("uploads"),
        };
        let memory = Arc::new(MemoryStore::new());
        let state = AppState::new(config, Stores::from_backend(memory.clone()));
        Self {
            app: router(state.clone()),
            state,
            memory,
            uploads,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.expect("request")
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, "docvault-tests/1.0")
            .body(Body::from(body.to_string()))
            .expect("build request");
        into_json(self.send(request).await).await
    }

    /// POST a raw body with an optional content type.
    pub async fn post_raw(
        &self,
        uri: &str,
        content_type: Option<&str>,
        body: &'static str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body)).expect("build request");
        into_json(self.send(request).await).await
    }

    pub async fn get_with_authorization(&self, uri: &str, authorization: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(uri)
            .header(AUTHORIZATION, authorization)
            .body(Body::empty())
            .expect("build request");
        self.send(request).await
    }

    pub async fn get_authed(&self, uri: &str, token: &str) -> Response<Body> {
        self.get_with_authorization(uri, &format!("Bearer {token}"))
            .await
    }

    /// Sign up and return `(access, refresh)`.
    pub async fn signup(&self, email: &str, username: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .post_json(
                "/signup",
                json!({ "email": email, "username": username, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
        tokens(&body)
    }

    /// Sign in and return `(access, refresh)`.
    pub async fn signin(&self, email: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .post_json("/signin", json!({ "email": email, "password": password }))
            .await;
        assert_eq!(status, StatusCode::OK, "signin failed: {body}");
        tokens(&body)
    }

    pub async fn refresh(&self, refresh_token: &str) -> (StatusCode, Value) {
        self.post_json("/signin/new_token", json!({ "refreshToken": refresh_token }))
            .await
    }

    pub async fn multipart(
        &self,
        method: &str,
        uri: &str,
        token: &str,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(file_name, content_type, bytes)))
            .expect("build request");
        into_json(self.send(request).await).await
    }
}

pub fn tokens(body: &Value) -> (String, String) {
    let access = body["accessToken"].as_str().expect("accessToken").to_string();
    let refresh = body["refreshToken"].as_str().expect("refreshToken").to_string();
    (access, refresh)
}

pub fn multipart_body(file_name: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

pub async fn into_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = body_bytes(response).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    (status, json)
}
