//! Offline index build.
//!
//! Embeds knowledge-base records in fixed-size chunks and writes the three
//! artifacts a server loads: the usearch index, the content file and the
//! manifest. Record ids are positional (`0..N-1`) and shared by index and
//! content file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use vet_embeddings::EmbeddingModel;
use vet_types::ContentRecord;

use crate::error::VectorError;
use crate::hnsw::{HnswConfig, HnswIndex};
use crate::index::{IndexStats, Metric, VectorIndex};
use crate::manifest::IndexManifest;
use crate::store::ContentStore;

/// Default index file name inside an output directory
pub const INDEX_FILE: &str = "vectors.usearch";

/// Default content file name inside an output directory
pub const CONTENT_FILE: &str = "content.json";

/// Paths of one index/content/manifest triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub index: PathBuf,
    pub content: PathBuf,
    pub manifest: PathBuf,
}

impl ArtifactPaths {
    /// Standard file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        let index = dir.join(INDEX_FILE);
        Self {
            manifest: manifest_path_for(&index),
            content: dir.join(CONTENT_FILE),
            index,
        }
    }
}

/// Manifest sidecar path for an index file.
pub fn manifest_path_for(index: &Path) -> PathBuf {
    let mut name = index.as_os_str().to_os_string();
    name.push(".manifest.json");
    PathBuf::from(name)
}

/// Build configuration
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Texts embedded per model call
    pub batch_size: usize,
    /// Distance metric baked into the index
    pub metric: Metric,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            metric: Metric::Cosine,
        }
    }
}

/// Result of a build, held in memory until written.
pub struct BuiltIndex {
    pub index: HnswIndex,
    pub store: ContentStore,
    pub manifest: IndexManifest,
}

impl BuiltIndex {
    /// Write all three artifacts.
    pub fn write(&self, paths: &ArtifactPaths) -> Result<(), VectorError> {
        self.index.save(&paths.index)?;
        self.store.save(&paths.content)?;
        self.manifest.save(&paths.manifest)?;
        info!(
            index = ?paths.index,
            content = ?paths.content,
            records = self.manifest.count,
            "Wrote index artifacts"
        );
        Ok(())
    }
}

/// Builds an index from knowledge-base records.
pub struct IndexBuilder {
    embedder: Arc<dyn EmbeddingModel>,
    config: BuildConfig,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn EmbeddingModel>, config: BuildConfig) -> Self {
        Self { embedder, config }
    }

    /// Embed every record and assemble index, store and manifest.
    pub fn build(&self, records: Vec<ContentRecord>) -> Result<BuiltIndex, VectorError> {
        let store = ContentStore::from_records(records);
        let texts: Vec<String> = store.iter().map(|(_, r)| r.embedding_text()).collect();

        let model = self.embedder.info();
        info!(
            records = texts.len(),
            model = %model.name,
            batch_size = self.config.batch_size,
            "Building index"
        );

        let embeddings = self.embedder.embed_chunked(&texts, self.config.batch_size)?;

        let hnsw = HnswConfig::new(model.dimension)
            .with_metric(self.config.metric)
            .with_capacity(embeddings.len().max(1));
        let mut index = HnswIndex::create(hnsw)?;
        for (id, embedding) in embeddings.iter().enumerate() {
            index.add(id as u64, embedding)?;
        }

        let manifest = IndexManifest::new(
            model.name.clone(),
            model.dimension,
            self.config.metric,
            index.len(),
        );
        Ok(BuiltIndex {
            index,
            store,
            manifest,
        })
    }

    /// Build and write to `paths`.
    pub fn build_to(
        &self,
        records: Vec<ContentRecord>,
        paths: &ArtifactPaths,
    ) -> Result<IndexManifest, VectorError> {
        let built = self.build(records)?;
        built.write(paths)?;
        Ok(built.manifest)
    }
}

/// Parse a JSON array of records, the build input format.
pub fn read_records(path: &Path) -> Result<Vec<ContentRecord>, VectorError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Summary of an artifact triple on disk.
#[derive(Debug, Clone)]
pub struct ArtifactReport {
    pub manifest: IndexManifest,
    pub index: IndexStats,
    pub records: usize,
}

impl ArtifactReport {
    /// True when index, manifest and content file agree on size.
    pub fn is_consistent(&self) -> bool {
        self.manifest.count == self.index.vector_count
            && self.manifest.count == self.records
            && self.manifest.dimension == self.index.dimension
    }
}

/// Load an artifact triple and report its shape without an embedder.
pub fn inspect(paths: &ArtifactPaths) -> Result<ArtifactReport, VectorError> {
    let manifest = IndexManifest::load(&paths.manifest)?;
    let config = HnswConfig::new(manifest.dimension).with_metric(manifest.metric);
    let index = HnswIndex::load(&paths.index, config)?;
    let store = ContentStore::load(&paths.content)?;

    Ok(ArtifactReport {
        index: index.stats(),
        records: store.len(),
        manifest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vet_embeddings::HashEmbedder;

    fn records(n: usize) -> Vec<ContentRecord> {
        (0..n)
            .map(|i| {
                ContentRecord::new(format!("Disease {}", i), "Cattle")
                    .with_symptoms(vec![format!("symptom {}", i)])
                    .with_treatment("rest")
            })
            .collect()
    }

    #[test]
    fn test_manifest_path_for() {
        let path = manifest_path_for(Path::new("/data/vectors.usearch"));
        assert_eq!(path, PathBuf::from("/data/vectors.usearch.manifest.json"));
    }

    #[test]
    fn test_build_assigns_positional_ids() {
        let builder = IndexBuilder::new(
            Arc::new(HashEmbedder::new(32)),
            BuildConfig {
                batch_size: 4,
                ..Default::default()
            },
        );
        let built = builder.build(records(10)).unwrap();

        assert_eq!(built.index.len(), 10);
        assert_eq!(built.store.len(), 10);
        assert_eq!(built.manifest.count, 10);
        assert_eq!(built.manifest.model, "hash-embedder-32");
        for id in 0..10 {
            assert!(built.index.contains(id));
            assert_eq!(built.store.get(id).unwrap().disease, format!("Disease {}", id));
        }
    }

    #[test]
    fn test_build_write_and_inspect() {
        let temp = TempDir::new().unwrap();
        let paths = ArtifactPaths::in_dir(temp.path());

        let builder = IndexBuilder::new(Arc::new(HashEmbedder::new(16)), BuildConfig::default());
        let manifest = builder.build_to(records(5), &paths).unwrap();
        assert_eq!(manifest.count, 5);

        let report = inspect(&paths).unwrap();
        assert!(report.is_consistent());
        assert_eq!(report.index.vector_count, 5);
        assert_eq!(report.index.dimension, 16);
        assert_eq!(report.records, 5);
    }

    #[test]
    fn test_build_empty_input() {
        let builder = IndexBuilder::new(Arc::new(HashEmbedder::new(8)), BuildConfig::default());
        let built = builder.build(Vec::new()).unwrap();
        assert!(built.index.is_empty());
        assert_eq!(built.manifest.count, 0);
    }

    #[test]
    fn test_read_records() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("records.json");
        std::fs::write(
            &path,
            r#"[{"disease": "Mastitis", "animal": "Cow", "symptoms": ["Swollen udder"]}]"#,
        )
        .unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].symptoms.items(), vec!["Swollen udder"]);
    }
}
