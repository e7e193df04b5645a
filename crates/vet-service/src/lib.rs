//! # vet-service
//!
//! Query pipeline for the veterinary answer service.
//!
//! [`SharedContext`] loads the embedder, index, content store, language
//! bridge and responder once per process. [`AnswerPipeline`] answers one query
//! at a time against that context:
//!
//! query -> detect/translate in -> embed -> search -> map ids -> compose ->
//! translate out -> answer

pub mod artifacts;
pub mod context;
pub mod error;
pub mod pipeline;

pub use artifacts::{ArtifactFetcher, ArtifactSource};
pub use context::{SharedContext, SystemContext};
pub use error::{InitError, QueryError, INVALID_QUERY_MESSAGE};
pub use pipeline::AnswerPipeline;
