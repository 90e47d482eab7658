//! # 认证模块
//!
//! 主服务商登录会话与 OAuth 服务商客户端

pub mod oauth;
pub mod session;

pub use oauth::{
    AccessToken, HttpProviderClient, IdentityView, ProviderClient, ProviderIdentity, ProviderKind,
};
pub use session::SessionCarrier;
