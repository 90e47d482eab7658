//! # 集成测试公共工具
//!
//! 用两个 wiremock 服务器分别扮演主/次服务商，资料文件放在临时目录中，
//! 通过 `oneshot` 直接驱动路由。
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use portfolio_api::api::{AppState, build_router};
use portfolio_api::auth::ProviderKind;
use portfolio_api::config::{AppConfig, ProviderSettings};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const FRONTEND_ORIGIN: &str = "http://localhost:8080";
pub const COOKIE_NAME: &str = "session_token";

/// 测试用应用实例
pub struct TestApp {
    pub router: Router,
    pub discord: MockServer,
    pub github: MockServer,
    pub profiles_path: PathBuf,
    _dir: TempDir,
}

/// 次服务商的配置方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Secondary {
    Mocked,
    Unreachable,
    Missing,
}

/// 一个无人监听的本地地址
pub fn unreachable_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

fn provider_settings(kind: ProviderKind, server: &MockServer) -> ProviderSettings {
    provider_settings_at(kind, &server.uri())
}

fn provider_settings_at(kind: ProviderKind, base: &str) -> ProviderSettings {
    ProviderSettings {
        client_id: Some(format!("{kind}-client-id")),
        client_secret: Some(format!("{kind}-client-secret")),
        redirect_uri: Some(format!("http://localhost:3001/api/{kind}/callback")),
        authorize_url: Some(format!("{base}/oauth2/authorize")),
        token_url: Some(format!("{base}/oauth2/token")),
        user_info_url: Some(format!("{base}/users/me")),
        ..ProviderSettings::new(kind)
    }
}

impl TestApp {
    /// 两个服务商都已配置
    pub async fn spawn() -> Self {
        Self::build(Secondary::Mocked).await
    }

    /// 只配置主服务商，账号关联关闭
    pub async fn spawn_without_secondary() -> Self {
        Self::build(Secondary::Missing).await
    }

    /// 次服务商已配置但地址无法连接
    pub async fn spawn_with_unreachable_secondary() -> Self {
        Self::build(Secondary::Unreachable).await
    }

    async fn build(secondary: Secondary) -> Self {
        let discord = MockServer::start().await;
        let github = MockServer::start().await;
        let dir = TempDir::new().expect("create temp dir");
        let profiles_path = dir.path().join("profiles.json");

        let mut config = AppConfig::default();
        config.frontend.origin = FRONTEND_ORIGIN.to_string();
        config.storage.profiles_path = profiles_path.to_string_lossy().into_owned();
        config.primary = provider_settings(ProviderKind::Discord, &discord);
        match secondary {
            Secondary::Mocked => {
                config.secondary = provider_settings(ProviderKind::GitHub, &github);
            }
            Secondary::Unreachable => {
                config.secondary = provider_settings_at(ProviderKind::GitHub, &unreachable_uri());
            }
            Secondary::Missing => {}
        }

        let state = AppState::from_config(Arc::new(config)).expect("build app state");
        let router = build_router(state).expect("build router");

        Self {
            router,
            discord,
            github,
            profiles_path,
            _dir: dir,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, session: Option<&str>) -> Response<Body> {
        self.request(build_request("GET", uri, session, None)).await
    }

    pub async fn post(&self, uri: &str, session: Option<&str>) -> Response<Body> {
        self.request(build_request("POST", uri, session, None)).await
    }

    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        session: Option<&str>,
        body: &str,
    ) -> Response<Body> {
        self.request(build_request(method, uri, session, Some(body)))
            .await
    }

    /// 读取资料文件，不存在时返回 None
    pub fn stored_profiles(&self) -> Option<Value> {
        std::fs::read_to_string(&self.profiles_path)
            .ok()
            .map(|raw| serde_json::from_str(&raw).expect("profiles file is valid JSON"))
    }

    pub fn seed_profiles(&self, profiles: &Value) {
        std::fs::write(
            &self.profiles_path,
            serde_json::to_string_pretty(profiles).expect("serialize seed"),
        )
        .expect("write seed profiles");
    }
}

pub fn build_request(
    method: &str,
    uri: &str,
    session: Option<&str>,
    json_body: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = session {
        builder = builder.header(header::COOKIE, format!("{COOKIE_NAME}={token}"));
    }
    match json_body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request"),
        None => builder.body(Body::empty()).expect("valid request"),
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().expect("ascii cookie").to_string())
        .collect()
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .expect("ascii location")
        .to_string()
}

/// 响应是否下发了会话 Cookie 的过期指令
pub fn clears_session(response: &Response<Body>) -> bool {
    set_cookies(response)
        .iter()
        .any(|c| c.starts_with(&format!("{COOKIE_NAME}=")) && c.contains("Max-Age=0"))
}

pub async fn mount_token(server: &MockServer, code: &str, access_token: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains(code))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": access_token, "token_type": "Bearer"})),
        )
        .mount(server)
        .await;
}

pub async fn mount_token_response(server: &MockServer, code: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains(code))
        .respond_with(response)
        .mount(server)
        .await;
}

pub async fn mount_identity(server: &MockServer, access_token: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header_eq("authorization", format!("Bearer {access_token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_identity_status(server: &MockServer, access_token: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header_eq("authorization", format!("Bearer {access_token}").as_str()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub fn discord_user(id: &str, username: &str) -> Value {
    serde_json::json!({
        "id": id,
        "username": username,
        "global_name": null,
        "avatar": null,
        "discriminator": "0"
    })
}

pub fn github_user(id: u64, login: &str) -> Value {
    serde_json::json!({
        "id": id,
        "login": login,
        "name": null,
        "avatar_url": format!("https://avatars.githubusercontent.com/u/{id}?v=4")
    })
}
