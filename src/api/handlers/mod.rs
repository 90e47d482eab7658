//! # HTTP 处理器

pub mod auth;
pub mod health;
pub mod link;
pub mod profile;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::api::response;
use crate::api::server::AppState;
use crate::api::services::AuthFlowService;
use crate::auth::ProviderIdentity;
use crate::logging::{LogComponent, LogStage};
use crate::lwarn;

/// OAuth 回调的查询参数
///
/// 服务商拒绝授权时只带 `error`，此时 `code` 为空。
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// 校验会话并解析当前主服务商身份
///
/// 没有 Cookie 时直接返回 401；令牌被服务商拒绝时同时清除 Cookie。
pub(crate) async fn authenticate(
    state: &AppState,
    jar: CookieJar,
) -> Result<(CookieJar, ProviderIdentity), Response> {
    let Some(token) = state.sessions.read(&jar) else {
        return Err(response::error(StatusCode::UNAUTHORIZED, "Not authenticated"));
    };

    match AuthFlowService::new(state).current_identity(&token).await {
        Ok(identity) => Ok((jar, identity)),
        Err(err) if err.as_oauth().is_some_and(|e| e.invalidates_session()) => {
            lwarn!(
                "session",
                LogStage::Authentication,
                LogComponent::Session,
                "session_invalidated",
                "Session token rejected by provider, clearing cookie",
                cookie = state.sessions.cookie_name()
            );
            Err((state.sessions.clear(jar), response::app_error(&err)).into_response())
        }
        Err(err) => Err(response::app_error(&err)),
    }
}
