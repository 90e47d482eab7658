//! # Portfolio API Library
//!
//! 个人主页后端核心库：主服务商 OAuth 登录、次服务商账号关联与资料存储

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod profile;
pub mod storage;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{PortfolioError, Result};
