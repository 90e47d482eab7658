//! # 资料存储抽象层
//!
//! 以主服务商用户ID为键的资料存储接口。写入只能通过 `upsert` 的合并函数完成，
//! 调用方无需关心底层的加锁方式。

mod json_file;

use async_trait::async_trait;

use crate::error::Result;
use crate::profile::ProfileRecord;

pub use json_file::JsonFileProfileStore;

/// 合并函数：接收当前记录（不存在时为 None），返回要保存的新记录
pub type MergeFn = Box<dyn FnOnce(Option<ProfileRecord>) -> ProfileRecord + Send>;

/// 资料存储trait
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// 读取单条记录
    async fn get(&self, primary_id: &str) -> Result<Option<ProfileRecord>>;

    /// 读取、合并并保存单条记录，返回保存后的结果
    async fn upsert(&self, primary_id: &str, merge: MergeFn) -> Result<ProfileRecord>;
}
