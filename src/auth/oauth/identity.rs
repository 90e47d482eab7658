//! 服务商身份与访问令牌

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::config::{ProviderConfig, ProviderKind};

/// 单次身份查询的结果，只在当前请求内使用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    pub provider: ProviderKind,
    /// 服务商分配的用户ID
    pub provider_user_id: String,
    /// 用户名
    pub handle: String,
    pub display_name: Option<String>,
    /// 服务商的头像标识（Discord 为 hash，GitHub 为完整地址）
    pub avatar_ref: Option<String>,
    /// 头像展示地址，没有头像标识时为空
    pub avatar_url: Option<String>,
}

/// `/me` 接口返回的身份结构
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityView {
    pub id: String,
    pub username: String,
    pub global_name: String,
    pub avatar: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&ProviderIdentity> for IdentityView {
    fn from(identity: &ProviderIdentity) -> Self {
        Self {
            id: identity.provider_user_id.clone(),
            username: identity.handle.clone(),
            global_name: identity
                .display_name
                .clone()
                .unwrap_or_else(|| identity.handle.clone()),
            avatar: identity.avatar_ref.clone(),
            avatar_url: identity.avatar_url.clone(),
        }
    }
}

/// 访问令牌
///
/// 只存在于浏览器 Cookie 中，服务端不保存。
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    issued_at: DateTime<Utc>,
    ttl: Duration,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &crate::logging::redact_token(&self.value))
            .field("issued_at", &self.issued_at)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl AccessToken {
    /// 主服务商令牌的固定有效期
    pub const SESSION_LIFETIME_DAYS: i64 = 7;

    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self::with_ttl(value, Duration::days(Self::SESSION_LIFETIME_DAYS))
    }

    #[must_use]
    pub fn with_ttl(value: impl Into<String>, ttl: Duration) -> Self {
        Self {
            value: value.into(),
            issued_at: Utc::now(),
            ttl,
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + self.ttl
    }
}

/// 令牌端点响应
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Discord `/users/@me` 响应
#[derive(Debug, Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
    #[serde(default)]
    global_name: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
}

/// GitHub `/user` 响应
#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: u64,
    login: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// 按服务商约定把原始响应映射为 [`ProviderIdentity`]
pub(crate) fn parse_identity(
    config: &ProviderConfig,
    body: &str,
) -> Result<ProviderIdentity, serde_json::Error> {
    match config.kind {
        ProviderKind::Discord => {
            let user: DiscordUser = serde_json::from_str(body)?;
            let avatar_ref = non_empty(user.avatar);
            let avatar_url = avatar_ref.as_ref().map(|hash| {
                format!(
                    "{}/avatars/{}/{hash}.png",
                    config.avatar_base_url.trim_end_matches('/'),
                    user.id
                )
            });
            Ok(ProviderIdentity {
                provider: config.kind,
                provider_user_id: user.id,
                handle: user.username,
                display_name: non_empty(user.global_name),
                avatar_ref,
                avatar_url,
            })
        }
        ProviderKind::GitHub => {
            let user: GitHubUser = serde_json::from_str(body)?;
            let avatar_ref = non_empty(user.avatar_url);
            Ok(ProviderIdentity {
                provider: config.kind,
                provider_user_id: user.id.to_string(),
                handle: user.login,
                display_name: non_empty(user.name),
                avatar_url: avatar_ref.clone(),
                avatar_ref,
            })
        }
    }
}
