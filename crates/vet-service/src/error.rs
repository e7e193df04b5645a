//! Service error types.

use thiserror::Error;
use vet_embeddings::EmbeddingError;
use vet_language::LanguageError;
use vet_responder::{GeneratorError, GENERATION_FAILED_MESSAGE};
use vet_vector::VectorError;

/// Message for rejected queries.
pub const INVALID_QUERY_MESSAGE: &str = "Please enter a valid query (max 500 characters).";

/// Startup failures. Any of these leaves the service without a context.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Artifact {location} unavailable: {reason}")]
    Artifact { location: String, reason: String },

    #[error("Download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("Embedding model error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Index error: {0}")]
    Vector(#[from] VectorError),

    #[error("Language service error: {0}")]
    Language(#[from] LanguageError),

    #[error("Responder error: {0}")]
    Responder(#[from] GeneratorError),

    #[error("Initialization task failed: {0}")]
    Task(String),
}

/// Per-request failures.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Query is empty")]
    EmptyQuery,

    #[error("Query is {actual} characters, limit is {max}")]
    QueryTooLong { max: usize, actual: usize },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl QueryError {
    /// Message safe to show to end users.
    ///
    /// Validation errors explain themselves; everything else is masked.
    pub fn user_message(&self) -> &'static str {
        match self {
            QueryError::EmptyQuery | QueryError::QueryTooLong { .. } => INVALID_QUERY_MESSAGE,
            QueryError::Embedding(_) | QueryError::Search(_) | QueryError::Unavailable(_) => {
                GENERATION_FAILED_MESSAGE
            }
        }
    }

    /// True for errors caused by the input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, QueryError::EmptyQuery | QueryError::QueryTooLong { .. })
    }
}

impl From<VectorError> for QueryError {
    fn from(e: VectorError) -> Self {
        match e {
            VectorError::Embedding(inner) => QueryError::Embedding(inner.to_string()),
            other => QueryError::Search(other.to_string()),
        }
    }
}
