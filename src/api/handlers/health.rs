//! 健康检查处理器

use axum::response::IntoResponse;
use serde::Serialize;

use crate::api::response;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

/// 存活探针，不依赖任何外部服务
pub async fn health_check() -> impl IntoResponse {
    response::success(HealthStatus { status: "ok" })
}
