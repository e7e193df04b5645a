//! Vector index error types.

use thiserror::Error;

use crate::index::Metric;

/// Errors that can occur while loading, building or searching an index.
#[derive(Debug, Error)]
pub enum VectorError {
    /// usearch index error
    #[error("Index error: {0}")]
    Index(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Index was built with a different embedding model
    #[error("Model mismatch: index built with {indexed}, embedder is {configured}")]
    ModelMismatch { indexed: String, configured: String },

    /// Index file was built under a different distance metric
    #[error("Metric mismatch: expected {expected:?}, index file uses {actual:?}")]
    MetricMismatch { expected: Metric, actual: Metric },

    /// Index and manifest disagree on the number of entries
    #[error("Entry count mismatch: manifest says {manifest}, index holds {index}")]
    CountMismatch { manifest: usize, index: usize },

    /// Malformed content file
    #[error("Invalid content file: {0}")]
    Content(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Embedding error
    #[error("Embedding error: {0}")]
    Embedding(#[from] vet_embeddings::EmbeddingError),
}
