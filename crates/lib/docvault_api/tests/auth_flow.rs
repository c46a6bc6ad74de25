//! Account and session flows through the full router.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{TestApp, into_json, tokens};
use docvault_api::config::Environment;
use serde_json::json;

const PASSWORD: &str = "Secret1!";

#[tokio::test]
async fn signup_then_info() {
    let t = TestApp::new();
    let (access, _) = t.signup("a@x.com", "user_1", PASSWORD).await;

    let (status, body) = into_json(t.get_authed("/info", &access).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "user_1");
    assert_eq!(body["email"], "a@x.com");
    assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(body.get("password").is_none());

    // Exactly one user and one active session.
    assert_eq!(t.memory.user_count().await, 1);
    let records = t.memory.tokens_of(body["id"].as_str().unwrap()).await;
    assert_eq!(records.len(), 1);
    assert!(records[0].is_active());
    assert_eq!(records[0].access_token, access);
    assert_eq!(records[0].device_info.as_deref(), Some("docvault-tests/1.0"));
}

#[tokio::test]
async fn signup_rejects_missing_and_malformed_fields() {
    let t = TestApp::new();

    let (status, body) = t
        .post_json("/signup", json!({ "email": "a@x.com", "password": PASSWORD }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required");

    let (status, body) = t
        .post_json(
            "/signup",
            json!({ "email": "not-an-email", "password": PASSWORD, "username": "user_1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid email format");

    let (status, _) = t
        .post_json(
            "/signup",
            json!({ "email": "a@x.com", "password": "weak", "username": "user_1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .post_json(
            "/signup",
            json!({ "email": "a@x.com", "password": PASSWORD, "username": "no spaces" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_signup_creates_nothing() {
    let t = TestApp::new();
    let (access, _) = t.signup("a@x.com", "user_1", PASSWORD).await;

    let duplicates = [
        json!({ "email": "b@x.com", "password": PASSWORD, "username": "user_1" }),
        json!({ "email": "a@x.com", "password": PASSWORD, "username": "user_2" }),
    ];
    for body in duplicates {
        let (status, response) = t.post_json("/signup", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["message"], "Username or email already exists");
    }

    assert_eq!(t.memory.user_count().await, 1);
    assert_eq!(t.memory.token_count().await, 1);
    // The existing session is untouched.
    assert_eq!(t.get_authed("/info", &access).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_account_bodies_are_validation_errors() {
    let t = TestApp::new();

    let (status, body) = t
        .post_raw(
            "/signup",
            Some("application/json"),
            r#"{"email": 5, "password": "Secret1!", "username": "user_1"}"#,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = t.post_raw("/signup", None, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required");

    let (status, body) = t.post_raw("/signin", Some("application/json"), "{oops").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = t.post_raw("/signin", Some("text/plain"), "a@x.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required");

    assert_eq!(t.memory.user_count().await, 0);
}

#[tokio::test]
async fn signin_checks_credentials() {
    let t = TestApp::new();
    t.signup("a@x.com", "user_1", PASSWORD).await;

    let (status, body) = t
        .post_json("/signin", json!({ "email": "a@x.com", "password": "Wrong1!x" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid password");

    let (status, _) = t
        .post_json("/signin", json!({ "email": "nobody@x.com", "password": PASSWORD }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Failed signins open no session.
    assert_eq!(t.memory.token_count().await, 1);

    let (access, _) = t.signin("a@x.com", PASSWORD).await;
    let response = t.get_authed("/info", &access).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let t = TestApp::new();

    let request = Request::builder()
        .uri("/info")
        .body(Body::empty())
        .unwrap();
    let (status, body) = into_json(t.send(request).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided");

    let (status, _) = into_json(t.get_authed("/info", "garbage").await).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let response = t.get_with_authorization("/info", "Bearer").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_authorization_headers_are_forbidden() {
    let t = TestApp::new();
    let (access, _) = t.signup("a@x.com", "user_1", PASSWORD).await;

    for header in [
        format!("Token {access}"),
        format!("bearer {access}"),
        "Basic dXNlcjpwYXNz".to_string(),
    ] {
        let (status, body) = into_json(t.get_with_authorization("/info", &header).await).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "header {header}");
        assert_eq!(body["error"], "forbidden");
    }

    let response = t.get_with_authorization("/info", &format!("Bearer {access}")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_rotates_and_retires_the_old_pair() {
    let t = TestApp::new();
    let (access_0, refresh_0) = t.signup("a@x.com", "user_1", PASSWORD).await;

    let (status, body) = t.refresh(&refresh_0).await;
    assert_eq!(status, StatusCode::OK);
    let (access_1, refresh_1) = tokens(&body);
    assert_ne!(refresh_1, refresh_0);

    let (status, body) = t.refresh(&refresh_1).await;
    assert_eq!(status, StatusCode::OK);
    let (access_2, _) = tokens(&body);

    // Superseded tokens stop working at once.
    let (status, _) = t.refresh(&refresh_0).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    for stale in [&access_0, &access_1] {
        let response = t.get_authed("/info", stale).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    let response = t.get_authed("/info", &access_2).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_rejects_missing_and_unknown_tokens() {
    let t = TestApp::new();

    let (status, _) = t.post_json("/signin/new_token", json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // No body at all, with or without a JSON content type.
    for content_type in [None, Some("application/json")] {
        let (status, body) = t.post_raw("/signin/new_token", content_type, "").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    let (status, body) = t
        .post_raw("/signin/new_token", Some("application/json"), r#"{"refreshToken": 5}"#)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = t.refresh("never-issued").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn logout_blocks_only_the_calling_device() {
    let t = TestApp::new();
    let (laptop, laptop_refresh) = t.signup("a@x.com", "user_1", PASSWORD).await;
    let (phone, _) = t.signin("a@x.com", PASSWORD).await;

    let response = t.get_authed("/logout", &laptop).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(
        t.get_authed("/info", &laptop).await.status(),
        StatusCode::FORBIDDEN
    );
    let (status, _) = t.refresh(&laptop_refresh).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(t.get_authed("/info", &phone).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_all_blocks_every_device() {
    let t = TestApp::new();
    let (laptop, laptop_refresh) = t.signup("a@x.com", "user_1", PASSWORD).await;
    let (phone, phone_refresh) = t.signin("a@x.com", PASSWORD).await;
    let (other, _) = t.signup("b@x.com", "user_2", PASSWORD).await;

    let response = t.get_authed("/logout/all", &phone).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    for (access, refresh) in [(&laptop, &laptop_refresh), (&phone, &phone_refresh)] {
        assert_eq!(
            t.get_authed("/info", access).await.status(),
            StatusCode::FORBIDDEN
        );
        let (status, _) = t.refresh(refresh).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
    assert_eq!(t.get_authed("/info", &other).await.status(), StatusCode::OK);

    // A fresh signin opens a new working session.
    let (fresh, _) = t.signin("a@x.com", PASSWORD).await;
    assert_eq!(t.get_authed("/info", &fresh).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn error_detail_depends_on_environment() {
    let production = TestApp::new();
    let (_, body) = production.refresh("never-issued").await;
    assert_eq!(body["error"], "forbidden");
    assert!(body.get("detail").is_none());

    let development = TestApp::with_environment(Environment::Development);
    let (status, body) = development.refresh("never-issued").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()));
}

#[tokio::test]
async fn health_reports_store_status() {
    let t = TestApp::new();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = into_json(t.send(request).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storeConnected"], true);
    assert_eq!(body["version"], docvault_core::version());
}
