//! 资料记录与合并规则

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::auth::ProviderIdentity;

/// 持久化的资料记录，以主服务商用户ID为键
///
/// 更新一律是合并：未知字段在读写之间原样保留。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// 次服务商用户名
    #[serde(default, alias = "github_username", skip_serializing_if = "Option::is_none")]
    pub secondary_handle: Option<String>,

    /// 只有关联流程成功后才会为 true
    #[serde(default, alias = "github_verified")]
    pub secondary_verified: bool,

    #[serde(
        default,
        alias = "github_id",
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub secondary_provider_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 兼容旧文件中以数字保存的ID
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl ProfileRecord {
    /// 写入关联流程验证过的次服务商身份
    pub fn apply_verified_link(&mut self, identity: &ProviderIdentity, now: DateTime<Utc>) {
        self.secondary_handle = Some(identity.handle.clone());
        self.secondary_provider_id = Some(identity.provider_user_id.clone());
        self.secondary_verified = true;
        self.updated_at = Some(now);
    }

    /// 应用用户提交的修改，验证状态保持不变
    pub fn apply_update(&mut self, update: &ProfileUpdate, now: DateTime<Utc>) {
        if let Some(handle) = update.normalized_handle() {
            self.secondary_handle = Some(handle);
            self.updated_at = Some(now);
        }
    }
}

/// 资料接口的请求体
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, alias = "github_username")]
    pub secondary_handle: Option<String>,
}

impl ProfileUpdate {
    /// 去除首尾空白后的用户名
    #[must_use]
    pub fn normalized_handle(&self) -> Option<String> {
        self.secondary_handle.as_deref().map(|h| h.trim().to_string())
    }

    /// 没有任何需要写入的字段
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.secondary_handle.is_none()
    }
}

/// 资料接口的响应体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub primary_id: String,
    pub secondary_handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_provider_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProfileView {
    /// 视图自身的字段，附加字段中的同名键会被丢弃
    const OWN_FIELDS: [&'static str; 5] = [
        "primary_id",
        "secondary_handle",
        "secondary_verified",
        "secondary_provider_id",
        "updated_at",
    ];

    /// 合并存储记录与默认结构，记录不存在时只返回空用户名
    #[must_use]
    pub fn new(primary_id: impl Into<String>, record: Option<ProfileRecord>) -> Self {
        let primary_id = primary_id.into();
        match record {
            Some(mut record) => {
                for key in Self::OWN_FIELDS {
                    record.extra.remove(key);
                }
                Self {
                    primary_id,
                    secondary_handle: record.secondary_handle.unwrap_or_default(),
                    secondary_verified: Some(record.secondary_verified),
                    secondary_provider_id: record.secondary_provider_id,
                    updated_at: record.updated_at,
                    extra: record.extra,
                }
            }
            None => Self {
                primary_id,
                secondary_handle: String::new(),
                secondary_verified: None,
                secondary_provider_id: None,
                updated_at: None,
                extra: Map::new(),
            },
        }
    }
}
