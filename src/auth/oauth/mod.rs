//! OAuth 服务商集成
//!
//! 提供服务商配置预设、授权码换令牌以及身份查询

pub mod client;
pub mod config;
pub mod identity;

pub use client::{HttpProviderClient, PROVIDER_REQUEST_TIMEOUT, PROVIDER_USER_AGENT, ProviderClient};
pub use config::{ProviderConfig, ProviderKind, ProviderPreset, TokenRequestEncoding};
pub use identity::{AccessToken, IdentityView, ProviderIdentity};
