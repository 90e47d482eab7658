//! 主服务商登录相关处理器

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use super::{CallbackQuery, authenticate};
use crate::api::response;
use crate::api::server::AppState;
use crate::api::services::AuthFlowService;
use crate::auth::IdentityView;
use crate::logging::{LogComponent, LogStage};
use crate::{linfo, lwarn};

/// 跳转到主服务商授权页
pub async fn login(State(state): State<AppState>) -> Response {
    response::found(AuthFlowService::new(&state).authorize_url().as_str())
}

/// 授权回调：建立会话后跳回前端
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Response {
    if let Some(denied) = query.error.as_deref() {
        lwarn!(
            "auth",
            LogStage::Authentication,
            LogComponent::AuthFlow,
            "provider_denied",
            &format!("Provider returned error: {denied}")
        );
    }

    match AuthFlowService::new(&state)
        .complete_login(query.code.as_deref())
        .await
    {
        Ok(session) => (
            state.sessions.issue(jar, &session.token),
            response::found(&state.config.frontend.origin),
        )
            .into_response(),
        Err(err) => response::app_error(&err),
    }
}

/// 当前登录用户
pub async fn me(State(state): State<AppState>, jar: CookieJar) -> Response {
    match authenticate(&state, jar).await {
        Ok((_, identity)) => response::success(IdentityView::from(&identity)),
        Err(rejection) => rejection,
    }
}

/// 退出登录，无论是否存在会话都会清除 Cookie
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    linfo!(
        "auth",
        LogStage::Authentication,
        LogComponent::AuthFlow,
        "logout",
        "Session cleared"
    );
    (
        state.sessions.clear(jar),
        response::message("Logged out successfully"),
    )
        .into_response()
}
