//! Errors raised while talking to an OAuth provider.
//!
//! Every variant is terminal for the current request. Authorization codes are
//! single-use, so callers never retry; they surface the error and let the user
//! restart the login or connect flow.

use axum::http::StatusCode;
use thiserror::Error;

/// Typed failures of a provider client call.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("{provider}: token exchange failed with HTTP {status}: {message}")]
    TokenExchange {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider}: token response did not contain an access_token")]
    MissingToken { provider: String },

    #[error("{provider}: access token was rejected by the identity endpoint")]
    InvalidToken { provider: String },

    #[error("{provider}: identity fetch failed with HTTP {status}")]
    IdentityFetch { provider: String, status: u16 },

    #[error("{provider}: network error: {message}")]
    Network { provider: String, message: String },

    #[error("{provider}: malformed response: {message}")]
    MalformedResponse { provider: String, message: String },
}

impl OAuthError {
    /// HTTP status used when the error is answered as JSON.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::TokenExchange { .. } | Self::MissingToken { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidToken { .. } => StatusCode::UNAUTHORIZED,
            Self::IdentityFetch { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Network { .. } | Self::MalformedResponse { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::TokenExchange { .. } => "TOKEN_EXCHANGE_FAILED",
            Self::MissingToken { .. } => "MISSING_ACCESS_TOKEN",
            Self::InvalidToken { .. } => "INVALID_TOKEN",
            Self::IdentityFetch { .. } => "IDENTITY_FETCH_FAILED",
            Self::Network { .. } => "PROVIDER_NETWORK_ERROR",
            Self::MalformedResponse { .. } => "PROVIDER_MALFORMED_RESPONSE",
        }
    }

    /// Message safe to hand to the browser.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::TokenExchange { .. } => "Failed to exchange code for token",
            Self::MissingToken { .. } => "Provider did not return an access token",
            Self::InvalidToken { .. } => "Invalid or expired token",
            Self::IdentityFetch { .. } => "Failed to fetch user data",
            Self::Network { .. } | Self::MalformedResponse { .. } => "Internal server error",
        }
    }

    /// True when the caller should drop the session cookie.
    #[must_use]
    pub const fn invalidates_session(&self) -> bool {
        matches!(self, Self::InvalidToken { .. })
    }

    pub(crate) fn network(provider: &str, err: &reqwest::Error) -> Self {
        Self::Network {
            provider: provider.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn malformed(provider: &str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}
