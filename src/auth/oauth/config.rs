//! OAuth2 服务商配置
//!
//! 定义服务商种类、各自的端点预设以及运行时使用的 `ProviderConfig`

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::config::ProviderSettings;
use crate::error::{PortfolioError, Result};

/// 支持的 OAuth 服务商
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Discord,
    #[serde(rename = "github")]
    GitHub,
}

/// 令牌请求体编码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRequestEncoding {
    /// application/x-www-form-urlencoded
    Form,
    /// application/json
    Json,
}

/// 服务商端点预设
#[derive(Debug, Clone, Copy)]
pub struct ProviderPreset {
    pub authorize_url: &'static str,
    pub token_url: &'static str,
    pub user_info_url: &'static str,
    pub scope: &'static str,
    pub avatar_base_url: &'static str,
}

const DISCORD_PRESET: ProviderPreset = ProviderPreset {
    authorize_url: "https://discord.com/api/oauth2/authorize",
    token_url: "https://discord.com/api/oauth2/token",
    user_info_url: "https://discord.com/api/users/@me",
    scope: "identify",
    avatar_base_url: "https://cdn.discordapp.com",
};

const GITHUB_PRESET: ProviderPreset = ProviderPreset {
    authorize_url: "https://github.com/login/oauth/authorize",
    token_url: "https://github.com/login/oauth/access_token",
    user_info_url: "https://api.github.com/user",
    scope: "read:user",
    avatar_base_url: "https://avatars.githubusercontent.com",
};

impl ProviderKind {
    /// 路由与错误码中使用的短名称
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Discord => "discord",
            Self::GitHub => "github",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Discord => "Discord",
            Self::GitHub => "GitHub",
        }
    }

    /// 环境变量前缀，例如 `DISCORD_CLIENT_ID`
    #[must_use]
    pub const fn env_prefix(self) -> &'static str {
        match self {
            Self::Discord => "DISCORD",
            Self::GitHub => "GITHUB",
        }
    }

    #[must_use]
    pub const fn token_encoding(self) -> TokenRequestEncoding {
        match self {
            Self::Discord => TokenRequestEncoding::Form,
            Self::GitHub => TokenRequestEncoding::Json,
        }
    }

    #[must_use]
    pub const fn preset(self) -> ProviderPreset {
        match self {
            Self::Discord => DISCORD_PRESET,
            Self::GitHub => GITHUB_PRESET,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// 运行时服务商配置
///
/// 由 [`ProviderSettings`] 解析而来，所有 URL 已校验。
#[derive(Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub authorize_url: Url,
    pub token_url: Url,
    pub user_info_url: Url,
    pub scope: String,
    pub avatar_base_url: String,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("redirect_uri", &self.redirect_uri)
            .field("authorize_url", &self.authorize_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("user_info_url", &self.user_info_url.as_str())
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ProviderConfig {
    /// 从配置项构建，缺少凭据时返回配置错误
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let kind = settings.kind;
        let preset = kind.preset();

        let required = |value: &Option<String>, field: &str| -> Result<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    crate::config_error!(
                        "{} 缺少 {}_{}",
                        kind.display_name(),
                        kind.env_prefix(),
                        field.to_uppercase()
                    )
                })
        };

        let parse_url = |value: Option<&str>, fallback: &str, field: &str| -> Result<Url> {
            let raw = value.unwrap_or(fallback);
            Url::parse(raw).map_err(|e| {
                PortfolioError::config_with_source(
                    format!("{} 的 {field} 不是合法URL: {raw}", kind.display_name()),
                    e,
                )
            })
        };

        Ok(Self {
            kind,
            client_id: required(&settings.client_id, "client_id")?,
            client_secret: required(&settings.client_secret, "client_secret")?,
            redirect_uri: required(&settings.redirect_uri, "redirect_uri")?,
            authorize_url: parse_url(
                settings.authorize_url.as_deref(),
                preset.authorize_url,
                "authorize_url",
            )?,
            token_url: parse_url(settings.token_url.as_deref(), preset.token_url, "token_url")?,
            user_info_url: parse_url(
                settings.user_info_url.as_deref(),
                preset.user_info_url,
                "user_info_url",
            )?,
            scope: settings
                .scope
                .clone()
                .unwrap_or_else(|| preset.scope.to_string()),
            avatar_base_url: settings
                .avatar_base_url
                .clone()
                .unwrap_or_else(|| preset.avatar_base_url.to_string()),
        })
    }

    /// 服务商短名称
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.slug()
    }

    /// 构建授权跳转地址
    ///
    /// 固定 `response_type=code`，不携带 state。
    #[must_use]
    pub fn build_authorize_url(&self) -> Url {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scope);
        url
    }
}
