//! # 资料服务
//!
//! 资料读取与用户名修改。这里的写入永远不会把记录标记为已验证。

use chrono::Utc;

use crate::api::server::AppState;
use crate::error::Result;
use crate::logging::{LogComponent, LogStage};
use crate::profile::{ProfileUpdate, ProfileView};
use crate::{ldebug, linfo};

pub struct ProfileService<'a> {
    state: &'a AppState,
}

impl<'a> ProfileService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// 读取资料，没有记录时返回默认结构
    pub async fn view(&self, primary_id: &str) -> Result<ProfileView> {
        let record = self.state.store.get(primary_id).await?;
        ldebug!(
            "profile",
            LogStage::Storage,
            LogComponent::ProfileApi,
            "profile_read",
            "Profile loaded",
            primary_id = primary_id,
            exists = record.is_some()
        );
        Ok(ProfileView::new(primary_id, record))
    }

    /// 合并用户提交的修改，返回是否发生了写入
    pub async fn update(&self, primary_id: &str, update: ProfileUpdate) -> Result<bool> {
        if update.is_empty() {
            ldebug!(
                "profile",
                LogStage::Storage,
                LogComponent::ProfileApi,
                "profile_update_skipped",
                "Nothing to update",
                primary_id = primary_id
            );
            return Ok(false);
        }

        let record = self
            .state
            .store
            .upsert(
                primary_id,
                Box::new(move |existing| {
                    let mut record = existing.unwrap_or_default();
                    record.apply_update(&update, Utc::now());
                    record
                }),
            )
            .await?;

        linfo!(
            "profile",
            LogStage::Storage,
            LogComponent::ProfileApi,
            "profile_updated",
            "Profile updated",
            primary_id = primary_id,
            verified = record.secondary_verified
        );
        Ok(true)
    }
}
