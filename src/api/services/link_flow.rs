//! # 账号关联流程服务
//!
//! 次服务商回调按固定顺序执行：会话检查、授权码检查、换取令牌、查询次服务商身份、
//! 用会话令牌重新确认主服务商身份、合并写入资料。任何一步失败都以
//! `error=<reason>` 跳回设置页，主服务商用户ID只来自重新确认的结果。

use chrono::Utc;
use std::fmt;

use crate::api::server::AppState;
use crate::auth::{ProviderClient, ProviderIdentity};
use crate::error::OAuthError;
use crate::logging::{LogComponent, LogStage};
use crate::profile::ProfileRecord;
use crate::{linfo, lwarn};

/// 关联流程所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFlowStage {
    RequireSession,
    AwaitingCode,
    ExchangingSecondaryToken,
    FetchingSecondaryIdentity,
    VerifyingPrimarySession,
    Merging,
    Linked,
}

impl LinkFlowStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequireSession => "require_session",
            Self::AwaitingCode => "awaiting_code",
            Self::ExchangingSecondaryToken => "exchanging_secondary_token",
            Self::FetchingSecondaryIdentity => "fetching_secondary_identity",
            Self::VerifyingPrimarySession => "verifying_primary_session",
            Self::Merging => "merging",
            Self::Linked => "linked",
        }
    }
}

/// 关联失败原因，对应设置页的 `error` 参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkFailure {
    NotAuthenticated,
    NoCode,
    TokenExchangeFailed,
    NoAccessToken,
    SecondaryFetchFailed { secondary: &'static str },
    PrimaryAuthFailed { primary: &'static str },
    Unknown,
}

impl LinkFailure {
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::NotAuthenticated => "not_authenticated".to_string(),
            Self::NoCode => "no_code".to_string(),
            Self::TokenExchangeFailed => "token_exchange_failed".to_string(),
            Self::NoAccessToken => "no_access_token".to_string(),
            Self::SecondaryFetchFailed { secondary } => format!("{secondary}_user_fetch_failed"),
            Self::PrimaryAuthFailed { primary } => format!("{primary}_auth_failed"),
            Self::Unknown => "unknown".to_string(),
        }
    }
}

impl fmt::Display for LinkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason())
    }
}

/// 关联成功的结果
#[derive(Debug, Clone)]
pub struct LinkedAccount {
    pub primary_id: String,
    pub record: ProfileRecord,
}

pub struct LinkFlowService<'a> {
    state: &'a AppState,
    secondary: &'a dyn ProviderClient,
}

impl<'a> LinkFlowService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState, secondary: &'a dyn ProviderClient) -> Self {
        Self { state, secondary }
    }

    /// 执行完整的关联回调
    pub async fn complete_link(
        &self,
        session_token: Option<&str>,
        code: Option<&str>,
    ) -> Result<LinkedAccount, LinkFailure> {
        let session_token = session_token
            .ok_or(LinkFailure::NotAuthenticated)
            .inspect_err(|f| self.log_failure(LinkFlowStage::RequireSession, f, "no session"))?;

        let code = code
            .filter(|c| !c.is_empty())
            .ok_or(LinkFailure::NoCode)
            .inspect_err(|f| self.log_failure(LinkFlowStage::AwaitingCode, f, "no code"))?;

        let stage = LinkFlowStage::ExchangingSecondaryToken;
        let secondary_token = self.secondary.exchange_code(code).await.map_err(|e| {
            let failure = match e {
                OAuthError::TokenExchange { .. } => LinkFailure::TokenExchangeFailed,
                OAuthError::MissingToken { .. } => LinkFailure::NoAccessToken,
                _ => LinkFailure::Unknown,
            };
            self.log_failure(stage, &failure, &e.to_string());
            failure
        })?;

        let stage = LinkFlowStage::FetchingSecondaryIdentity;
        let secondary_identity = self
            .secondary
            .fetch_identity(secondary_token.value())
            .await
            .map_err(|e| {
                let failure = match e {
                    OAuthError::InvalidToken { .. } | OAuthError::IdentityFetch { .. } => {
                        LinkFailure::SecondaryFetchFailed {
                            secondary: self.secondary.kind().slug(),
                        }
                    }
                    _ => LinkFailure::Unknown,
                };
                self.log_failure(stage, &failure, &e.to_string());
                failure
            })?;

        let stage = LinkFlowStage::VerifyingPrimarySession;
        let primary_identity = self
            .state
            .primary
            .fetch_identity(session_token)
            .await
            .map_err(|e| {
                let failure = match e {
                    OAuthError::InvalidToken { .. } | OAuthError::IdentityFetch { .. } => {
                        LinkFailure::PrimaryAuthFailed {
                            primary: self.state.primary.kind().slug(),
                        }
                    }
                    _ => LinkFailure::Unknown,
                };
                self.log_failure(stage, &failure, &e.to_string());
                failure
            })?;

        let record = self
            .merge(&primary_identity.provider_user_id, secondary_identity.clone())
            .await?;

        linfo!(
            "link",
            LogStage::Linking,
            LogComponent::LinkFlow,
            LinkFlowStage::Linked.as_str(),
            "Secondary account linked",
            primary_id = primary_identity.provider_user_id,
            secondary = self.secondary.kind(),
            secondary_handle = secondary_identity.handle
        );

        Ok(LinkedAccount {
            primary_id: primary_identity.provider_user_id,
            record,
        })
    }

    async fn merge(
        &self,
        primary_id: &str,
        secondary_identity: ProviderIdentity,
    ) -> Result<ProfileRecord, LinkFailure> {
        self.state
            .store
            .upsert(
                primary_id,
                Box::new(move |existing| {
                    let mut record = existing.unwrap_or_default();
                    record.apply_verified_link(&secondary_identity, Utc::now());
                    record
                }),
            )
            .await
            .map_err(|e| {
                self.log_failure(LinkFlowStage::Merging, &LinkFailure::Unknown, &e.to_string());
                LinkFailure::Unknown
            })
    }

    /// 设置页跳转地址
    #[must_use]
    pub fn settings_redirect(&self, outcome: &Result<LinkedAccount, LinkFailure>) -> String {
        let settings = self.state.config.frontend.settings_url();
        match outcome {
            Ok(_) => format!("{settings}?{}_connected=true", self.secondary.kind().slug()),
            Err(failure) => format!("{settings}?error={}", failure.reason()),
        }
    }

    fn log_failure(&self, stage: LinkFlowStage, failure: &LinkFailure, detail: &str) {
        lwarn!(
            "link",
            LogStage::Linking,
            LogComponent::LinkFlow,
            "link_failed",
            &format!("Account linking failed: {detail}"),
            flow_stage = stage.as_str(),
            reason = failure
        );
    }
}
