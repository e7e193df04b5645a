//! Local cache of sentence-transformer files.
//!
//! Files are fetched from the HuggingFace Hub into `root` using the hub's own
//! cache layout, so the serving process and the index builder find the same
//! weights without a second download.

use std::path::PathBuf;

use hf_hub::api::sync::ApiBuilder;
use hf_hub::Cache;
use tracing::{debug, info};

use crate::error::EmbeddingError;

/// Model used when none is configured
pub const DEFAULT_MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";

/// Files a BERT-style sentence-transformer needs
pub const MODEL_FILES: [&str; 3] = [CONFIG_FILE, TOKENIZER_FILE, WEIGHTS_FILE];

/// Resolved paths of one model's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

/// Where a model repository is cached on disk.
#[derive(Debug, Clone)]
pub struct ModelCache {
    pub root: PathBuf,
    pub repo_id: String,
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new(Self::default_root(), DEFAULT_MODEL_REPO)
    }
}

impl ModelCache {
    pub fn new(root: impl Into<PathBuf>, repo_id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            repo_id: repo_id.into(),
        }
    }

    /// `<platform cache dir>/vet-assist/models`
    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("vet-assist")
            .join("models")
    }

    /// Use the platform cache dir unless an override is given.
    pub fn from_settings(cache_dir: Option<&str>, repo_id: impl Into<String>) -> Self {
        let root = cache_dir
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_root);
        Self::new(root, repo_id)
    }

    /// Paths of the model files if every one is already on disk.
    pub fn cached_files(&self) -> Option<ModelFiles> {
        let repo = Cache::new(self.root.clone()).model(self.repo_id.clone());
        Some(ModelFiles {
            config: repo.get(CONFIG_FILE)?,
            tokenizer: repo.get(TOKENIZER_FILE)?,
            weights: repo.get(WEIGHTS_FILE)?,
        })
    }

    /// Return cached files, downloading any that are missing.
    pub fn fetch(&self) -> Result<ModelFiles, EmbeddingError> {
        if let Some(files) = self.cached_files() {
            debug!(repo = %self.repo_id, root = ?self.root, "Using cached model");
            return Ok(files);
        }

        info!(repo = %self.repo_id, "Downloading model files");
        let api = ApiBuilder::new()
            .with_cache_dir(self.root.clone())
            .with_progress(false)
            .build()
            .map_err(|e| EmbeddingError::Download(e.to_string()))?;
        let repo = api.model(self.repo_id.clone());

        let get = |name: &str| {
            let path = repo
                .get(name)
                .map_err(|e| EmbeddingError::Download(format!("{}: {}", name, e)))?;
            debug!(file = name, path = ?path, "Fetched model file");
            Ok::<_, EmbeddingError>(path)
        };

        Ok(ModelFiles {
            config: get(CONFIG_FILE)?,
            tokenizer: get(TOKENIZER_FILE)?,
            weights: get(WEIGHTS_FILE)?,
        })
    }
}
