//! # 登录流程集成测试
//!
//! 覆盖登录跳转、回调建立会话、`/me`、退出登录以及 CORS。

mod common;

use axum::http::{Method, Request, StatusCode, header};
use axum::body::Body;
use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use wiremock::ResponseTemplate;

#[tokio::test]
async fn test_login_redirects_to_provider() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/discord/login", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let target = url::Url::parse(&location(&response)).unwrap();
    assert_eq!(target.path(), "/oauth2/authorize");
    let params: HashMap<_, _> = target.query_pairs().into_owned().collect();
    assert_eq!(params["client_id"], "discord-client-id");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["scope"], "identify");
    assert_eq!(
        params["redirect_uri"],
        "http://localhost:3001/api/discord/callback"
    );
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_callback_without_code_is_rejected_without_cookie() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/discord/callback", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookies(&response).is_empty());

    let body = json_body(response).await;
    assert_eq!(body, json!({"error": "Missing authorization code"}));
}

#[tokio::test]
async fn test_callback_with_rejected_code() {
    let app = TestApp::spawn().await;
    mount_token_response(
        &app.discord,
        "used-code",
        ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
    )
    .await;

    let response = app.get("/api/discord/callback?code=used-code", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(
        json_body(response).await,
        json!({"error": "Failed to exchange code for token"})
    );
}

#[tokio::test]
async fn test_callback_token_response_without_access_token() {
    let app = TestApp::spawn().await;
    mount_token_response(
        &app.discord,
        "empty-code",
        ResponseTemplate::new(200).set_body_json(json!({"error": "bad_verification_code"})),
    )
    .await;

    let response = app.get("/api/discord/callback?code=empty-code", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(
        json_body(response).await,
        json!({"error": "Provider did not return an access token"})
    );
}

#[tokio::test]
async fn test_callback_identity_outage_is_internal_error() {
    let app = TestApp::spawn().await;
    mount_token(&app.discord, "good-code", "fresh-token").await;
    mount_identity_status(&app.discord, "fresh-token", 503).await;

    let response = app.get("/api/discord/callback?code=good-code", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(
        json_body(response).await,
        json!({"error": "Internal server error"})
    );
}

#[tokio::test]
async fn test_callback_when_identity_token_rejected() {
    let app = TestApp::spawn().await;
    mount_token(&app.discord, "odd-code", "odd-token").await;
    mount_identity_status(&app.discord, "odd-token", 401).await;

    let response = app.get("/api/discord/callback?code=odd-code", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_login_then_me_round_trip() {
    let app = TestApp::spawn().await;
    mount_token(&app.discord, "valid-code", "tok-123").await;
    mount_identity(&app.discord, "tok-123", discord_user("123", "alice")).await;

    let response = app.get("/api/discord/callback?code=valid-code", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), FRONTEND_ORIGIN);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("session_token=tok-123"));
    assert!(cookies[0].contains("HttpOnly"));
    assert!(cookies[0].contains("SameSite=Lax"));
    assert!(cookies[0].contains("Max-Age=604800"));

    let response = app.get("/api/discord/me", Some("tok-123")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({
            "id": "123",
            "username": "alice",
            "global_name": "alice",
            "avatar": null,
            "avatar_url": null
        })
    );
}

#[tokio::test]
async fn test_me_builds_avatar_url() {
    let app = TestApp::spawn().await;
    mount_identity(
        &app.discord,
        "tok-avatar",
        json!({"id": "77", "username": "bea", "global_name": "Bea", "avatar": "a1b2"}),
    )
    .await;

    let body = json_body(app.get("/api/discord/me", Some("tok-avatar")).await).await;
    assert_eq!(body["global_name"], "Bea");
    assert_eq!(body["avatar"], "a1b2");
    assert_eq!(
        body["avatar_url"],
        "https://cdn.discordapp.com/avatars/77/a1b2.png"
    );
}

#[tokio::test]
async fn test_me_without_cookie() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/discord/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(json_body(response).await, json!({"error": "Not authenticated"}));
}

#[tokio::test]
async fn test_me_with_invalid_token_clears_cookie() {
    let app = TestApp::spawn().await;
    mount_identity_status(&app.discord, "expired", 401).await;

    let response = app.get("/api/discord/me", Some("expired")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(clears_session(&response));
    assert_eq!(
        json_body(response).await,
        json!({"error": "Invalid or expired token"})
    );
}

#[tokio::test]
async fn test_me_passes_through_upstream_failure_status() {
    let app = TestApp::spawn().await;
    mount_identity_status(&app.discord, "throttled", 429).await;

    let response = app.get("/api/discord/me", Some("throttled")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(!clears_session(&response));
    assert_eq!(
        json_body(response).await,
        json!({"error": "Failed to fetch user data"})
    );
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let app = TestApp::spawn().await;

    for session in [Some("tok-123"), None] {
        let response = app.post("/api/discord/logout", session).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(clears_session(&response));
        assert_eq!(
            json_body(response).await,
            json!({"message": "Logged out successfully"})
        );
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;

    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_cors_allows_only_frontend_with_credentials() {
    let app = TestApp::spawn().await;

    let preflight = |origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/profile")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .body(Body::empty())
            .unwrap()
    };

    let response = app.request(preflight(FRONTEND_ORIGIN)).await;
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        FRONTEND_ORIGIN
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );

    let response = app.request(preflight("https://evil.example")).await;
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}
