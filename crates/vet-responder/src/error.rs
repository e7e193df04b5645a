//! Generator error types.

use thiserror::Error;

/// Errors from a language-model backend.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Missing API key (set {0})")]
    MissingCredential(String),

    #[error("Timeout waiting for response")]
    Timeout,

    #[error("Model returned no text")]
    EmptyOutput,
}

impl GeneratorError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GeneratorError::ApiError(_) | GeneratorError::RateLimitExceeded | GeneratorError::Timeout
        )
    }
}
