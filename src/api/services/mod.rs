//! # 服务层
//!
//! 登录、关联与资料三条流程的业务逻辑，HTTP handler 只负责提取参数和组装响应。

pub mod auth_flow;
pub mod link_flow;
pub mod profile;

pub use auth_flow::{AuthFlowService, AuthFlowStage, EstablishedSession};
pub use link_flow::{LinkFailure, LinkFlowService, LinkFlowStage, LinkedAccount};
pub use profile::ProfileService;
