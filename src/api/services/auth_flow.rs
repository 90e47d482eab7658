//! # 登录流程服务
//!
//! 主服务商的授权跳转、回调换取令牌以及会话身份解析。每个请求独立走完
//! `AwaitingCode → ExchangingToken → FetchingIdentity → SessionEstablished`，
//! 不在请求之间保存任何状态。

use url::Url;

use crate::api::server::AppState;
use crate::auth::{AccessToken, ProviderIdentity};
use crate::error::{OAuthError, PortfolioError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo, lwarn};

/// 登录流程所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlowStage {
    AwaitingCode,
    ExchangingToken,
    FetchingIdentity,
    SessionEstablished,
}

impl AuthFlowStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingCode => "awaiting_code",
            Self::ExchangingToken => "exchanging_token",
            Self::FetchingIdentity => "fetching_identity",
            Self::SessionEstablished => "session_established",
        }
    }
}

/// 登录成功的结果
#[derive(Debug, Clone)]
pub struct EstablishedSession {
    pub token: AccessToken,
    pub identity: ProviderIdentity,
}

pub struct AuthFlowService<'a> {
    state: &'a AppState,
}

impl<'a> AuthFlowService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// 主服务商授权地址
    #[must_use]
    pub fn authorize_url(&self) -> Url {
        let url = self.state.primary.build_authorize_url();
        ldebug!(
            "auth",
            LogStage::Authentication,
            LogComponent::AuthFlow,
            "login_redirect",
            "Redirecting to primary provider",
            provider = self.state.primary.kind()
        );
        url
    }

    /// 处理回调：授权码换令牌，再用令牌确认身份
    pub async fn complete_login(&self, code: Option<&str>) -> Result<EstablishedSession> {
        let mut stage = AuthFlowStage::AwaitingCode;
        let code = code.filter(|c| !c.is_empty()).ok_or_else(|| {
            self.log_failure(stage, "authorization code missing");
            PortfolioError::validation("Missing authorization code", Some("code".to_string()))
        })?;

        stage = AuthFlowStage::ExchangingToken;
        let token = self
            .state
            .primary
            .exchange_code(code)
            .await
            .inspect_err(|e| self.log_failure(stage, &e.to_string()))?;

        stage = AuthFlowStage::FetchingIdentity;
        let identity = self
            .state
            .primary
            .fetch_identity(token.value())
            .await
            .map_err(|e| {
                self.log_failure(stage, &e.to_string());
                match e {
                    // 回调阶段的身份查询失败不透传上游状态码
                    OAuthError::IdentityFetch { .. } => PortfolioError::internal_with_source(
                        "Identity fetch failed during login callback",
                        e,
                    ),
                    other => PortfolioError::OAuth(other),
                }
            })?;

        stage = AuthFlowStage::SessionEstablished;
        linfo!(
            "auth",
            LogStage::Authentication,
            LogComponent::AuthFlow,
            stage.as_str(),
            "Primary session established",
            provider = self.state.primary.kind(),
            user_id = identity.provider_user_id
        );

        Ok(EstablishedSession { token, identity })
    }

    /// 用会话令牌查询当前身份
    pub async fn current_identity(&self, token: &str) -> Result<ProviderIdentity> {
        self.state
            .primary
            .fetch_identity(token)
            .await
            .map_err(PortfolioError::from)
    }

    fn log_failure(&self, stage: AuthFlowStage, detail: &str) {
        lwarn!(
            "auth",
            LogStage::Authentication,
            LogComponent::AuthFlow,
            "login_failed",
            &format!("Login failed: {detail}"),
            flow_stage = stage.as_str(),
            provider = self.state.primary.kind()
        );
    }
}
