//! # 错误类型定义

use axum::http::StatusCode;
use thiserror::Error;

use super::auth::OAuthError;

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 资料存储错误
    #[error("存储错误: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// OAuth 服务商调用错误
    #[error("OAuth错误: {0}")]
    OAuth(#[from] OAuthError),

    /// 请求参数校验错误
    #[error("验证错误: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// 服务器启动错误
    #[error("服务器启动错误: {message}")]
    ServerStart {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 带上下文的错误
    #[error("{context}")]
    Context {
        context: String,
        #[source]
        source: Box<PortfolioError>,
    },
}

impl PortfolioError {
    /// 将错误转换为HTTP状态码和错误代码
    #[must_use]
    pub fn to_http_response_parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Config { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Self::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            Self::OAuth(err) => (err.status_code(), err.code()),
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            Self::Serialization { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR"),
            Self::ServerStart { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_START_ERROR"),
            Self::Context { source, .. } => source.to_http_response_parts(),
        }
    }

    /// 面向客户端的错误消息
    ///
    /// 内部错误不暴露细节，只返回通用提示。
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::OAuth(err) => err.public_message().to_string(),
            Self::Validation { message, .. } => message.clone(),
            Self::Context { source, .. } => source.public_message(),
            _ => "Internal server error".to_string(),
        }
    }

    /// 沿上下文链找到最内层的 OAuth 错误
    #[must_use]
    pub fn as_oauth(&self) -> Option<&OAuthError> {
        match self {
            Self::OAuth(err) => Some(err),
            Self::Context { source, .. } => source.as_oauth(),
            _ => None,
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建存储错误
    pub fn storage<T: Into<String>>(message: T) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的存储错误
    pub fn storage_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建校验错误
    pub fn validation<T: Into<String>>(message: T, field: Option<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field,
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建带来源的服务器启动错误
    pub fn server_start_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::ServerStart {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 获取错误的分类
    #[must_use]
    pub fn category(&self) -> super::ErrorCategory {
        if self.to_http_response_parts().0.is_client_error() {
            super::ErrorCategory::Client
        } else {
            super::ErrorCategory::Server
        }
    }
}

impl From<std::io::Error> for PortfolioError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "文件操作失败".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for PortfolioError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON处理失败".to_string(),
            source: err.into(),
        }
    }
}

impl From<toml::de::Error> for PortfolioError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}
