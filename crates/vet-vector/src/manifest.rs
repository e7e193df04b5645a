//! Index manifest sidecar.
//!
//! Records which embedding model produced an index so that a server never
//! searches vectors from one model with queries from another.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use vet_embeddings::ModelInfo;

use crate::error::VectorError;
use crate::index::{Metric, VectorIndex};

/// Metadata written next to every built index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// Embedding model identifier used at build time
    pub model: String,
    /// Vector dimension
    pub dimension: usize,
    /// Distance metric
    #[serde(default)]
    pub metric: Metric,
    /// Number of vectors (and content records)
    pub count: usize,
}

impl IndexManifest {
    pub fn new(model: impl Into<String>, dimension: usize, metric: Metric, count: usize) -> Self {
        Self {
            model: model.into(),
            dimension,
            metric,
            count,
        }
    }

    /// Read a manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self, VectorError> {
        let raw = std::fs::read_to_string(path)?;
        let manifest: IndexManifest = serde_json::from_str(&raw)?;
        debug!(path = ?path, model = %manifest.model, count = manifest.count, "Read manifest");
        Ok(manifest)
    }

    /// Write the manifest as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), VectorError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check the manifest against the configured embedder and the loaded index.
    pub fn validate(&self, model: &ModelInfo, index: &dyn VectorIndex) -> Result<(), VectorError> {
        if self.model != model.name {
            return Err(VectorError::ModelMismatch {
                indexed: self.model.clone(),
                configured: model.name.clone(),
            });
        }
        if self.dimension != model.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: model.dimension,
                actual: self.dimension,
            });
        }
        if self.dimension != index.dimension() {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: index.dimension(),
            });
        }
        if self.count != index.len() {
            return Err(VectorError::CountMismatch {
                manifest: self.count,
                index: index.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flat::FlatIndex;
    use tempfile::TempDir;
    use vet_embeddings::Embedding;

    fn info(name: &str, dimension: usize) -> ModelInfo {
        ModelInfo {
            name: name.to_string(),
            dimension,
            max_sequence_length: 256,
        }
    }

    fn index_with(count: usize, dimension: usize) -> FlatIndex {
        let mut index = FlatIndex::new(dimension, Metric::Cosine);
        for id in 0..count {
            let mut values = vec![0.0; dimension];
            values[id % dimension] = 1.0;
            index.add(id as u64, &Embedding::new(values)).unwrap();
        }
        index
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vectors.usearch.manifest.json");

        let manifest = IndexManifest::new("mini", 4, Metric::L2, 12);
        manifest.save(&path).unwrap();

        let loaded = IndexManifest::load(&path).unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_missing_metric_defaults_to_cosine() {
        let manifest: IndexManifest =
            serde_json::from_str(r#"{"model": "mini", "dimension": 4, "count": 2}"#).unwrap();
        assert_eq!(manifest.metric, Metric::Cosine);
    }

    #[test]
    fn test_validate_accepts_matching_setup() {
        let manifest = IndexManifest::new("mini", 4, Metric::Cosine, 3);
        assert!(manifest
            .validate(&info("mini", 4), &index_with(3, 4))
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_other_model() {
        let manifest = IndexManifest::new("mini", 4, Metric::Cosine, 3);
        let err = manifest
            .validate(&info("other", 4), &index_with(3, 4))
            .unwrap_err();
        assert!(matches!(err, VectorError::ModelMismatch { .. }));
    }

    #[test]
    fn test_validate_rejects_dimension_and_count() {
        let manifest = IndexManifest::new("mini", 4, Metric::Cosine, 3);

        let err = manifest
            .validate(&info("mini", 8), &index_with(3, 4))
            .unwrap_err();
        assert!(matches!(err, VectorError::DimensionMismatch { .. }));

        let err = manifest
            .validate(&info("mini", 4), &index_with(2, 4))
            .unwrap_err();
        assert!(matches!(
            err,
            VectorError::CountMismatch {
                manifest: 3,
                index: 2
            }
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = IndexManifest::load(&temp.path().join("nope.json"));
        assert!(matches!(result, Err(VectorError::Io(_))));
    }
}
