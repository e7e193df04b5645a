//! # vet-vector
//!
//! Read-only vector search over the veterinary knowledge base.
//!
//! The index is built offline by [`IndexBuilder`] and loaded once per process.
//! Vector ids are positional and resolve to [`vet_types::ContentRecord`]s
//! through the [`ContentStore`].
//!
//! ## Features
//! - usearch-powered HNSW index (cosine or L2)
//! - Exact flat index for small corpora and tests
//! - Manifest sidecar pinning the embedding model and dimension
//! - Retriever: embed, search, map ids to records

pub mod builder;
pub mod error;
pub mod flat;
pub mod hnsw;
pub mod index;
pub mod manifest;
pub mod retriever;
pub mod store;

pub use builder::{
    inspect, manifest_path_for, read_records, ArtifactPaths, ArtifactReport, BuildConfig,
    BuiltIndex, IndexBuilder, CONTENT_FILE, INDEX_FILE,
};
pub use error::VectorError;
pub use flat::FlatIndex;
pub use hnsw::{stored_metric, HnswConfig, HnswIndex};
pub use index::{IndexStats, Metric, Neighbor, VectorIndex, NO_MATCH_KEY};
pub use manifest::IndexManifest;
pub use retriever::{RetrievedRecord, Retriever};
pub use store::ContentStore;
