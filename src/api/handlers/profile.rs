//! 资料接口处理器

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use super::authenticate;
use crate::api::response;
use crate::api::server::AppState;
use crate::api::services::ProfileService;
use crate::logging::{LogComponent, LogStage};
use crate::lwarn;
use crate::profile::ProfileUpdate;

/// 读取当前用户资料
pub async fn get_profile(State(state): State<AppState>, jar: CookieJar) -> Response {
    let identity = match authenticate(&state, jar).await {
        Ok((_, identity)) => identity,
        Err(rejection) => return rejection,
    };

    match ProfileService::new(&state)
        .view(&identity.provider_user_id)
        .await
    {
        Ok(view) => response::success(view),
        Err(err) => response::app_error(&err),
    }
}

/// 修改当前用户资料（POST 与 PUT 相同）
///
/// 先校验会话再解析请求体。
pub async fn update_profile(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Response {
    let identity = match authenticate(&state, jar).await {
        Ok((_, identity)) => identity,
        Err(rejection) => return rejection,
    };

    let update = match payload {
        Ok(Json(update)) => update,
        Err(rejection) => {
            lwarn!(
                "profile",
                LogStage::Response,
                LogComponent::ProfileApi,
                "invalid_body",
                &format!("Rejected profile body: {}", rejection.body_text()),
                primary_id = identity.provider_user_id
            );
            return response::error(StatusCode::BAD_REQUEST, "Invalid JSON body");
        }
    };

    match ProfileService::new(&state)
        .update(&identity.provider_user_id, update)
        .await
    {
        Ok(_) => response::message("Profile updated successfully"),
        Err(err) => response::app_error(&err),
    }
}
