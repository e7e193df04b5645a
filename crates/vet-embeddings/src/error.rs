//! Embedding errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Model inference failed: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Config or weights present but unusable
    #[error("Invalid model files: {0}")]
    InvalidModel(String),

    #[error("Model download failed: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller passed something that cannot be embedded
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model output width differs from the configured dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
