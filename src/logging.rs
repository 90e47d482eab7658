//! # 日志配置模块
//!
//! 提供日志初始化以及带阶段/组件标签的结构化日志宏

use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 请求处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    Startup,
    Shutdown,
    Configuration,
    Authentication,
    Linking,
    ExternalApi,
    Storage,
    Response,
    Error,
}

impl LogStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Configuration => "configuration",
            Self::Authentication => "authentication",
            Self::Linking => "linking",
            Self::ExternalApi => "external_api",
            Self::Storage => "storage",
            Self::Response => "response",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    Main,
    Config,
    ServerSetup,
    OAuth,
    Session,
    AuthFlow,
    LinkFlow,
    ProfileApi,
    ProfileStore,
}

impl LogComponent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Config => "config",
            Self::ServerSetup => "server_setup",
            Self::OAuth => "oauth",
            Self::Session => "session",
            Self::AuthFlow => "auth_flow",
            Self::LinkFlow => "link_flow",
            Self::ProfileApi => "profile_api",
            Self::ProfileStore => "profile_store",
        }
    }
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 结构化 info 日志
///
/// `linfo!(request_id, stage, component, operation, message, key = value, ...)`
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = %$operation,
            $($key = %$value,)*
            "{}",
            $message
        )
    };
}

/// 结构化 warn 日志
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = %$operation,
            $($key = %$value,)*
            "{}",
            $message
        )
    };
}

/// 结构化 error 日志
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = %$operation,
            $($key = %$value,)*
            "{}",
            $message
        )
    };
}

/// 结构化 debug 日志
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = %$operation,
            $($key = %$value,)*
            "{}",
            $message
        )
    };
}

/// 初始化优化的日志系统
pub fn init_optimized_logging(log_level: Option<&String>) {
    let level = log_level.map_or("info", std::string::String::as_str);

    // 默认配置：应用自身 debug，HTTP 访问日志 info，依赖库只保留警告
    let default_filter = format!("{level},portfolio_api=debug,tower_http=info,hyper=warn,reqwest=warn");

    let log_filter = env::var("RUST_LOG").unwrap_or(default_filter);

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();

    if result.is_err() {
        tracing::debug!("global subscriber already installed, skipping logging init");
    }
}

/// 令牌在日志中的安全表示，只保留长度
#[must_use]
pub fn redact_token(token: &str) -> String {
    format!("<redacted:{} chars>", token.len())
}
