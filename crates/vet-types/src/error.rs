//! Error types shared across the veterinary answer service.

use thiserror::Error;

/// Unified error type for configuration and record handling.
#[derive(Debug, Error)]
pub enum VetError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
