//! 次服务商账号关联处理器

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use super::CallbackQuery;
use crate::api::response;
use crate::api::server::AppState;
use crate::api::services::LinkFlowService;
use crate::logging::{LogComponent, LogStage};
use crate::lwarn;

fn not_configured(state: &AppState) -> Response {
    response::error(
        StatusCode::INTERNAL_SERVER_ERROR,
        &format!(
            "{} OAuth not configured",
            state.config.secondary.kind.display_name()
        ),
    )
}

/// 跳转到次服务商授权页，需要已登录主服务商
pub async fn connect(State(state): State<AppState>, jar: CookieJar) -> Response {
    if state.sessions.read(&jar).is_none() {
        return response::error(
            StatusCode::UNAUTHORIZED,
            &format!(
                "Not authenticated with {}",
                state.primary.kind().display_name()
            ),
        );
    }

    match state.secondary.as_deref() {
        Some(secondary) => response::found(secondary.build_authorize_url().as_str()),
        None => not_configured(&state),
    }
}

/// 关联回调，结果总是以跳转回设置页的形式返回
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Response {
    let Some(secondary) = state.secondary.as_deref() else {
        return not_configured(&state);
    };

    if let Some(denied) = query.error.as_deref() {
        lwarn!(
            "link",
            LogStage::Linking,
            LogComponent::LinkFlow,
            "provider_denied",
            &format!("Provider returned error: {denied}")
        );
    }

    let service = LinkFlowService::new(&state, secondary);
    let session_token = state.sessions.read(&jar);
    let outcome = service
        .complete_link(session_token.as_deref(), query.code.as_deref())
        .await;

    response::found(&service.settings_redirect(&outcome))
}
