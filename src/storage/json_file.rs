//! # JSON 文件存储
//!
//! 全部资料保存在一个格式化的 JSON 对象里，键为主服务商用户ID。
//! 读取-合并-写入整个周期由一把异步互斥锁串行化，写入先落到同目录的临时文件再改名覆盖。

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{MergeFn, ProfileStore};
use crate::error::{PortfolioError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::profile::ProfileRecord;
use crate::{ldebug, lerror};

type ProfileMap = BTreeMap<String, ProfileRecord>;

/// 基于单个 JSON 文件的资料存储
#[derive(Debug)]
pub struct JsonFileProfileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_else(|| "profiles.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// 读取整个文件，文件不存在或为空时视为空集合
    async fn load(&self) -> Result<ProfileMap> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ProfileMap::new()),
            Err(e) => {
                return Err(PortfolioError::storage_with_source(
                    format!("读取资料文件失败: {}", self.path.display()),
                    e,
                ));
            }
        };

        if content.trim().is_empty() {
            return Ok(ProfileMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            PortfolioError::storage_with_source(
                format!("资料文件格式错误: {}", self.path.display()),
                e,
            )
        })
    }

    async fn save(&self, profiles: &ProfileMap) -> Result<()> {
        let content = serde_json::to_string_pretty(profiles)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                PortfolioError::storage_with_source(
                    format!("创建资料目录失败: {}", parent.display()),
                    e,
                )
            })?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, content).await.map_err(|e| {
            PortfolioError::storage_with_source(format!("写入临时文件失败: {}", temp.display()), e)
        })?;
        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            PortfolioError::storage_with_source(
                format!("替换资料文件失败: {}", self.path.display()),
                e,
            )
        })
    }
}

#[async_trait]
impl ProfileStore for JsonFileProfileStore {
    async fn get(&self, primary_id: &str) -> Result<Option<ProfileRecord>> {
        let mut profiles = self.load().await.inspect_err(|e| {
            lerror!(
                "storage",
                LogStage::Storage,
                LogComponent::ProfileStore,
                "load_failed",
                &format!("Failed to load profiles: {e}")
            );
        })?;
        Ok(profiles.remove(primary_id))
    }

    async fn upsert(&self, primary_id: &str, merge: MergeFn) -> Result<ProfileRecord> {
        let _guard = self.write_lock.lock().await;

        let mut profiles = self.load().await?;
        let merged = merge(profiles.remove(primary_id));
        profiles.insert(primary_id.to_string(), merged.clone());

        self.save(&profiles).await.inspect_err(|e| {
            lerror!(
                "storage",
                LogStage::Storage,
                LogComponent::ProfileStore,
                "save_failed",
                &format!("Failed to save profiles: {e}"),
                primary_id = primary_id
            );
        })?;

        ldebug!(
            "storage",
            LogStage::Storage,
            LogComponent::ProfileStore,
            "profile_saved",
            "Profile record saved",
            primary_id = primary_id,
            total = profiles.len()
        );

        Ok(merged)
    }
}
