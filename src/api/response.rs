//! # API 响应结构
//!
//! 错误一律为 `{"error": "..."}`，确认类响应为 `{"message": "..."}`，
//! 跳转使用 302 Found。

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCategory, PortfolioError};
use crate::logging::{LogComponent, LogStage};
use crate::{lerror, lwarn};

/// # 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// # 确认消息响应
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

/// # 便捷函数：成功响应
pub fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// # 便捷函数：确认消息
pub fn message(message: &str) -> Response {
    success(MessageBody {
        message: message.to_string(),
    })
}

/// # 便捷函数：HTTP错误响应
pub fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// # 便捷函数：应用错误响应
///
/// 服务端错误只返回通用提示，详细信息写入日志。
pub fn app_error(err: &PortfolioError) -> Response {
    let (status, code) = err.to_http_response_parts();
    if err.category() == ErrorCategory::Server {
        lerror!(
            "api",
            LogStage::Error,
            LogComponent::ServerSetup,
            "request_failed",
            &format!("Request failed: {err}"),
            code = code
        );
    } else {
        lwarn!(
            "api",
            LogStage::Response,
            LogComponent::ServerSetup,
            "request_rejected",
            &format!("Request rejected: {err}"),
            code = code
        );
    }
    error(status, &err.public_message())
}

/// # 便捷函数：302 跳转
///
/// `Redirect::to` 固定返回 303，这里需要与浏览器 OAuth 流程约定的 302。
pub fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = error(StatusCode::BAD_REQUEST, "Missing authorization code");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, serde_json::json!({"error": "Missing authorization code"}));
    }

    #[tokio::test]
    async fn test_internal_errors_are_masked() {
        let response = app_error(&PortfolioError::storage("disk full at /var/lib"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(value.error, "Internal server error");
    }

    #[test]
    fn test_found_is_302_with_location() {
        let response = found("https://discord.com/api/oauth2/authorize?client_id=1");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://discord.com/api/oauth2/authorize?client_id=1"
        );
    }
}
