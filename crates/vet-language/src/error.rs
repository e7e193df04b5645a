//! Language service error types.

use thiserror::Error;

/// Errors from detection or translation backends.
///
/// These never reach the user: the bridge turns them into a defaulted
/// detection or a passthrough translation.
#[derive(Debug, Error)]
pub enum LanguageError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Timeout waiting for response")]
    Timeout,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("No language signal in input")]
    NoSignal,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl LanguageError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LanguageError::Timeout | LanguageError::RateLimited => true,
            LanguageError::Request(_) => true,
            LanguageError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for LanguageError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LanguageError::Timeout
        } else if e.is_decode() {
            LanguageError::Parse(e.to_string())
        } else {
            LanguageError::Request(e.to_string())
        }
    }
}
