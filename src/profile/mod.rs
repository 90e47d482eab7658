//! # 用户资料模块
//!
//! 资料记录的数据结构以及两条写入路径的合并规则：
//! 关联流程写入经过验证的次服务商身份，资料接口只修改用户名且不改变验证状态。

mod record;

pub use record::{ProfileRecord, ProfileUpdate, ProfileView};
