//! # HTTP API 模块
//!
//! 登录、账号关联、资料读写与健康检查接口

pub mod handlers;
pub mod response;
pub mod routes;
pub mod server;
pub mod services;

pub use routes::create_routes;
pub use server::{ApiServer, AppState, build_router};
