//! # 服务商客户端
//!
//! 授权码换取令牌、按令牌查询身份。两步都不重试：授权码只能使用一次，
//! 失败后由用户重新发起流程。

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use super::config::{ProviderConfig, ProviderKind, TokenRequestEncoding};
use super::identity::{AccessToken, ProviderIdentity, TokenResponse, parse_identity};
use crate::error::{OAuthError, OAuthResult};
use crate::logging::{LogComponent, LogStage, redact_token};
use crate::{ldebug, lwarn};

/// 出站请求的统一超时
pub const PROVIDER_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 出站请求的 User-Agent，GitHub 要求必须携带
pub const PROVIDER_USER_AGENT: &str = "Portfolio-App";

/// OAuth 服务商客户端
///
/// 路由层只依赖这个 trait，测试时可以替换为任意实现。
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn config(&self) -> &ProviderConfig;

    fn kind(&self) -> ProviderKind {
        self.config().kind
    }

    /// 授权跳转地址
    fn build_authorize_url(&self) -> Url {
        self.config().build_authorize_url()
    }

    /// 用授权码换取访问令牌
    async fn exchange_code(&self, code: &str) -> OAuthResult<AccessToken>;

    /// 用访问令牌查询当前用户身份
    async fn fetch_identity(&self, token: &str) -> OAuthResult<ProviderIdentity>;
}

/// 基于 reqwest 的服务商客户端
#[derive(Debug, Clone)]
pub struct HttpProviderClient {
    config: ProviderConfig,
    http_client: reqwest::Client,
}

impl HttpProviderClient {
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(PROVIDER_REQUEST_TIMEOUT)
            .user_agent(PROVIDER_USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
        }
    }

    fn token_params<'a>(&'a self, code: &'a str) -> HashMap<&'static str, &'a str> {
        HashMap::from([
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ])
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn exchange_code(&self, code: &str) -> OAuthResult<AccessToken> {
        let provider = self.config.name();
        let params = self.token_params(code);

        let request = self
            .http_client
            .post(self.config.token_url.clone())
            .header(ACCEPT, "application/json");
        let request = match self.config.kind.token_encoding() {
            TokenRequestEncoding::Form => request.form(&params),
            TokenRequestEncoding::Json => request.json(&params),
        };

        ldebug!(
            "oauth",
            LogStage::ExternalApi,
            LogComponent::OAuth,
            "token_exchange",
            "Exchanging authorization code",
            provider = provider,
            token_url = self.config.token_url
        );

        let response = request
            .send()
            .await
            .map_err(|e| OAuthError::network(provider, &e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::network(provider, &e))?;

        if !status.is_success() {
            lwarn!(
                "oauth",
                LogStage::ExternalApi,
                LogComponent::OAuth,
                "token_exchange_failed",
                "Token endpoint returned an error status",
                provider = provider,
                status = status.as_u16()
            );
            return Err(OAuthError::TokenExchange {
                provider: provider.to_string(),
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| OAuthError::malformed(provider, format!("token response: {e}")))?;

        match parsed.access_token.filter(|t| !t.is_empty()) {
            Some(token) => {
                ldebug!(
                    "oauth",
                    LogStage::ExternalApi,
                    LogComponent::OAuth,
                    "token_exchange_ok",
                    "Access token received",
                    provider = provider,
                    token = redact_token(&token)
                );
                Ok(AccessToken::new(token))
            }
            None => {
                // GitHub 对失效的 code 返回 200 加 error 字段
                lwarn!(
                    "oauth",
                    LogStage::ExternalApi,
                    LogComponent::OAuth,
                    "token_missing",
                    "Token response had no access_token",
                    provider = provider,
                    error = parsed.error.unwrap_or_default(),
                    error_description = parsed.error_description.unwrap_or_default()
                );
                Err(OAuthError::MissingToken {
                    provider: provider.to_string(),
                })
            }
        }
    }

    async fn fetch_identity(&self, token: &str) -> OAuthResult<ProviderIdentity> {
        let provider = self.config.name();

        let response = self
            .http_client
            .get(self.config.user_info_url.clone())
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| OAuthError::network(provider, &e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(OAuthError::InvalidToken {
                provider: provider.to_string(),
            });
        }
        if !status.is_success() {
            lwarn!(
                "oauth",
                LogStage::ExternalApi,
                LogComponent::OAuth,
                "identity_fetch_failed",
                "Identity endpoint returned an error status",
                provider = provider,
                status = status.as_u16()
            );
            return Err(OAuthError::IdentityFetch {
                provider: provider.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::network(provider, &e))?;

        parse_identity(&self.config, &body)
            .map_err(|e| OAuthError::malformed(provider, format!("identity response: {e}")))
    }
}
