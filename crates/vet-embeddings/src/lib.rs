//! # vet-embeddings
//!
//! Text embeddings for the veterinary answer service.
//!
//! The same model must embed the knowledge base at build time and every query
//! at serve time; the model identifier is therefore exposed through
//! [`ModelInfo`] so it can be persisted with the index.
//!
//! ## Features
//! - Local inference via Candle (no Python, no API)
//! - all-MiniLM-L6-v2 model (384 dimensions)
//! - Automatic model file caching
//! - Chunked batch embedding for index builds
//! - Deterministic hashing embedder for tests and offline tooling

pub mod cache;
pub mod candle;
pub mod error;
pub mod hash;
pub mod model;

pub use crate::candle::CandleEmbedder;
pub use cache::{ModelCache, ModelFiles, DEFAULT_MODEL_REPO, MODEL_FILES};
pub use error::EmbeddingError;
pub use hash::HashEmbedder;
pub use model::{Embedding, EmbeddingModel, ModelInfo};
