//! # 应用配置结构定义

use crate::auth::oauth::ProviderKind;
use serde::{Deserialize, Serialize};

/// 应用主配置结构
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP 服务器配置
    pub server: ServerConfig,
    /// 前端站点配置
    pub frontend: FrontendConfig,
    /// 会话 Cookie 配置
    pub session: SessionConfig,
    /// 资料存储配置
    pub storage: StorageConfig,
    /// 主 OAuth 服务商（登录用，必须配置）
    pub primary: ProviderSettings,
    /// 次 OAuth 服务商（账号关联用，可选）
    pub secondary: ProviderSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            frontend: FrontendConfig::default(),
            session: SessionConfig::default(),
            storage: StorageConfig::default(),
            primary: ProviderSettings::new(ProviderKind::Discord),
            secondary: ProviderSettings::new(ProviderKind::GitHub),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

/// 前端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// 前端源地址，同时用于 CORS 白名单和登录后的跳转
    pub origin: String,
    /// 账号关联结果回跳的设置页路径
    pub settings_path: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".to_string(),
            settings_path: "/settings".to_string(),
        }
    }
}

impl FrontendConfig {
    /// 设置页的完整地址
    #[must_use]
    pub fn settings_url(&self) -> String {
        format!(
            "{}/{}",
            self.origin.trim_end_matches('/'),
            self.settings_path.trim_start_matches('/')
        )
    }
}

/// 会话 Cookie 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie 名称
    pub cookie_name: String,
    /// 是否只在 HTTPS 下发送
    pub cookie_secure: bool,
    /// 有效天数
    pub max_age_days: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session_token".to_string(),
            cookie_secure: false,
            max_age_days: 7,
        }
    }
}

/// 资料存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 资料 JSON 文件路径
    pub profiles_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            profiles_path: "profiles.json".to_string(),
        }
    }
}

/// 单个 OAuth 服务商的配置
///
/// 端点与 scope 缺省时使用服务商预设值。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub authorize_url: Option<String>,
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub user_info_url: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub avatar_base_url: Option<String>,
}

impl ProviderSettings {
    #[must_use]
    pub const fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            authorize_url: None,
            token_url: None,
            user_info_url: None,
            scope: None,
            avatar_base_url: None,
        }
    }

    /// 缺失的凭据字段名（空字符串视为缺失）
    #[must_use]
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let blank = |value: &Option<String>| value.as_deref().is_none_or(|v| v.trim().is_empty());

        let mut missing = Vec::new();
        if blank(&self.client_id) {
            missing.push("client_id");
        }
        if blank(&self.client_secret) {
            missing.push("client_secret");
        }
        if blank(&self.redirect_uri) {
            missing.push("redirect_uri");
        }
        missing
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_credentials().is_empty()
    }
}

/// 账号关联功能是否可用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkingCapability {
    Enabled,
    Disabled { missing: Vec<&'static str> },
}

impl LinkingCapability {
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl AppConfig {
    /// 根据次服务商凭据判断关联功能是否启用
    #[must_use]
    pub fn linking_capability(&self) -> LinkingCapability {
        let missing = self.secondary.missing_credentials();
        if missing.is_empty() {
            LinkingCapability::Enabled
        } else {
            LinkingCapability::Disabled { missing }
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be greater than 0".to_string());
        }

        let missing = self.primary.missing_credentials();
        if !missing.is_empty() {
            let prefix = self.primary.kind.env_prefix();
            let vars = missing
                .iter()
                .map(|field| format!("{prefix}_{}", field.to_uppercase()))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(format!(
                "Missing required {} OAuth settings: {vars}",
                self.primary.kind.display_name()
            ));
        }

        if self.primary.kind == self.secondary.kind {
            return Err("primary and secondary providers must be different kinds".to_string());
        }

        if self.frontend.origin.trim().is_empty() {
            return Err("frontend.origin cannot be empty".to_string());
        }

        if self.session.cookie_name.trim().is_empty() {
            return Err("session.cookie_name cannot be empty".to_string());
        }

        if self.session.max_age_days <= 0 {
            return Err("session.max_age_days must be greater than 0".to_string());
        }

        Ok(())
    }
}
