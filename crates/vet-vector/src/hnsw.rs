//! HNSW index implementation using usearch.
//!
//! Parameters match the offline build used for the knowledge base:
//! - M = 16 (connections per layer)
//! - ef_construction = 200 (build-time quality)
//! - ef_search = 100 (search-time quality)
//!
//! The index is mutable only while it is being built. Once saved and loaded
//! for serving it is searched through `&self` without locking.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, info};
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};
use vet_embeddings::Embedding;

use crate::error::VectorError;
use crate::index::{Metric, Neighbor, VectorIndex, NO_MATCH_KEY};

/// HNSW index configuration
#[derive(Debug, Clone)]
pub struct HnswConfig {
    /// Embedding dimension (must match model)
    pub dimension: usize,
    /// Distance metric
    pub metric: Metric,
    /// Number of connections per layer (M parameter)
    pub connectivity: usize,
    /// Build-time search depth (ef_construction)
    pub expansion_add: usize,
    /// Query-time search depth (ef_search)
    pub expansion_search: usize,
    /// Pre-allocated capacity when building
    pub capacity: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            dimension: 384, // all-MiniLM-L6-v2
            metric: Metric::Cosine,
            connectivity: 16,
            expansion_add: 200,
            expansion_search: 100,
            capacity: 1_024,
        }
    }
}

impl HnswConfig {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ..Default::default()
        }
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    fn options(&self) -> IndexOptions {
        IndexOptions {
            dimensions: self.dimension,
            metric: match self.metric {
                Metric::Cosine => MetricKind::Cos,
                Metric::L2 => MetricKind::L2sq,
            },
            quantization: ScalarKind::F32,
            connectivity: self.connectivity,
            expansion_add: self.expansion_add,
            expansion_search: self.expansion_search,
            multi: false, // Single vector per key
        }
    }
}

const HEADER_MAGIC: &[u8] = b"usearch";
const HEADER_LEN: u64 = 64;
const HEADER_METRIC_OFFSET: usize = 13;

/// Metric recorded in a saved index file.
///
/// usearch restores the metric from this header on load, ignoring the
/// options the index was created with. The header follows an optional
/// vector matrix prefixed by 32- or 64-bit (rows, bytes per row).
pub fn stored_metric(path: &Path) -> Result<Metric, VectorError> {
    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();
    if file_len < HEADER_LEN {
        return Err(VectorError::Index(format!(
            "index file too short: {}",
            path.display()
        )));
    }

    let mut prefix = [0u8; 16];
    file.read_exact(&mut prefix)?;
    let rows32 = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as u64;
    let cols32 = u32::from_le_bytes([prefix[4], prefix[5], prefix[6], prefix[7]]) as u64;
    let mut rows64 = [0u8; 8];
    let mut cols64 = [0u8; 8];
    rows64.copy_from_slice(&prefix[..8]);
    cols64.copy_from_slice(&prefix[8..]);

    let candidates = [
        Some(0),
        rows32.checked_mul(cols32).and_then(|n| n.checked_add(8)),
        u64::from_le_bytes(rows64)
            .checked_mul(u64::from_le_bytes(cols64))
            .and_then(|n| n.checked_add(16)),
    ];

    let mut header = [0u8; HEADER_LEN as usize];
    for offset in candidates.into_iter().flatten() {
        if offset.checked_add(HEADER_LEN).map_or(true, |end| end > file_len) {
            continue;
        }
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut header)?;
        if header.starts_with(HEADER_MAGIC) {
            return match header[HEADER_METRIC_OFFSET] {
                b'c' => Ok(Metric::Cosine),
                b'e' => Ok(Metric::L2),
                other => Err(VectorError::Index(format!(
                    "unsupported metric kind {:?} in {}",
                    other as char,
                    path.display()
                ))),
            };
        }
    }

    Err(VectorError::Index(format!(
        "not a usearch index: {}",
        path.display()
    )))
}

/// HNSW index wrapper around usearch.
pub struct HnswIndex {
    index: Index,
    config: HnswConfig,
}

fn path_str(path: &Path) -> Result<&str, VectorError> {
    path.to_str()
        .ok_or_else(|| VectorError::Index("Invalid path encoding".to_string()))
}

impl HnswIndex {
    /// Create an empty index for building.
    pub fn create(config: HnswConfig) -> Result<Self, VectorError> {
        let index = Index::new(&config.options()).map_err(|e| VectorError::Index(e.to_string()))?;
        index
            .reserve(config.capacity)
            .map_err(|e| VectorError::Index(e.to_string()))?;

        debug!(dim = config.dimension, capacity = config.capacity, "Created index");
        Ok(Self { index, config })
    }

    /// Load a saved index for serving.
    ///
    /// Fails if the stored dimension or metric differs from `config`.
    pub fn load(path: &Path, config: HnswConfig) -> Result<Self, VectorError> {
        if !path.exists() {
            return Err(VectorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("index file not found: {}", path.display()),
            )));
        }

        let stored = stored_metric(path)?;
        if stored != config.metric {
            return Err(VectorError::MetricMismatch {
                expected: config.metric,
                actual: stored,
            });
        }

        let index = Index::new(&config.options()).map_err(|e| VectorError::Index(e.to_string()))?;
        index
            .load(path_str(path)?)
            .map_err(|e| VectorError::Index(format!("Failed to load: {}", e)))?;

        if index.dimensions() != config.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: config.dimension,
                actual: index.dimensions(),
            });
        }

        info!(path = ?path, vectors = index.size(), dim = config.dimension, "Loaded vector index");
        Ok(Self { index, config })
    }

    /// Add a vector under the given id.
    pub fn add(&mut self, id: u64, embedding: &Embedding) -> Result<(), VectorError> {
        if embedding.dimension() != self.config.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.config.dimension,
                actual: embedding.dimension(),
            });
        }
        if id == NO_MATCH_KEY {
            return Err(VectorError::Index(format!("id {} is reserved", id)));
        }

        if self.index.size() >= self.index.capacity() {
            self.index
                .reserve(self.index.capacity().max(1) * 2)
                .map_err(|e| VectorError::Index(e.to_string()))?;
        }

        self.index
            .add(id, &embedding.values)
            .map_err(|e| VectorError::Index(e.to_string()))?;
        Ok(())
    }

    /// Check if a vector id exists
    pub fn contains(&self, id: u64) -> bool {
        self.index.contains(id)
    }

    /// Save the index to disk.
    pub fn save(&self, path: &Path) -> Result<(), VectorError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.index
            .save(path_str(path)?)
            .map_err(|e| VectorError::Index(format!("Failed to save: {}", e)))?;

        info!(path = ?path, vectors = self.index.size(), "Saved vector index");
        Ok(())
    }
}

impl VectorIndex for HnswIndex {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn len(&self) -> usize {
        self.index.size()
    }

    fn metric(&self) -> Metric {
        self.config.metric
    }

    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<Neighbor>, VectorError> {
        if query.dimension() != self.config.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.config.dimension,
                actual: query.dimension(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let matches = self
            .index
            .search(&query.values, k)
            .map_err(|e| VectorError::Index(e.to_string()))?;

        let neighbors: Vec<Neighbor> = matches
            .keys
            .iter()
            .zip(matches.distances.iter())
            .filter(|(&id, _)| id != NO_MATCH_KEY)
            .map(|(&id, &distance)| Neighbor::new(id, distance))
            .collect();

        debug!(k = k, found = neighbors.len(), "Search complete");
        Ok(neighbors)
    }
}
