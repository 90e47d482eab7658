//! The unified error handling system for the application.

// 1. Core Types
pub use auth::OAuthError;
pub use types::PortfolioError;

/// A unified `Result` type for the entire application.
///
/// All functions that can fail should return this type.
pub type Result<T> = std::result::Result<T, PortfolioError>;

/// Result alias for provider client calls.
pub type OAuthResult<T> = std::result::Result<T, OAuthError>;

// 3. Module declarations
pub mod auth;
pub mod macros;
pub mod types;

// 4. Context Trait for adding context to errors.
pub trait Context<T, E> {
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display;

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<PortfolioError>,
{
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display,
    {
        self.with_context(|| context)
    }

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        match self {
            Ok(value) => Ok(value),
            Err(error) => {
                let context_message = context().to_string();
                Err(PortfolioError::Context {
                    context: context_message,
                    source: Box::new(error.into()),
                })
            }
        }
    }
}

// 5. Error Category for monitoring and alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Errors caused by the client (e.g., bad input, invalid credentials).
    /// Corresponds to 4xx HTTP status codes.
    Client,
    /// Errors caused by the server or its dependencies.
    /// Corresponds to 5xx HTTP status codes.
    Server,
}
