//! Configuration loading for the veterinary answer service.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! Default config file lives at ~/.config/vet-assist/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::VetError;

/// Locations of the paired index/content artifacts.
///
/// Each location is either a local path or an `http(s)://` URL; remote
/// artifacts are downloaded into `cache_dir` at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactSettings {
    /// Vector index file (usearch format)
    #[serde(default = "default_index_location")]
    pub index: String,

    /// Content file keyed by stringified id
    #[serde(default = "default_content_location")]
    pub content: String,

    /// Manifest sidecar; defaults to `<index>.manifest.json`
    #[serde(default)]
    pub manifest: Option<String>,

    /// Where downloaded artifacts are written
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Per-download timeout in seconds
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

fn data_dir() -> PathBuf {
    ProjectDirs::from("", "", "vet-assist")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

fn default_index_location() -> String {
    data_dir()
        .join("vectors.usearch")
        .to_string_lossy()
        .to_string()
}

fn default_content_location() -> String {
    data_dir().join("content.json").to_string_lossy().to_string()
}

fn default_cache_dir() -> String {
    data_dir().join("downloads").to_string_lossy().to_string()
}

fn default_download_timeout() -> u64 {
    120
}

impl Default for ArtifactSettings {
    fn default() -> Self {
        Self {
            index: default_index_location(),
            content: default_content_location(),
            manifest: None,
            cache_dir: default_cache_dir(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

impl ArtifactSettings {
    /// Manifest location, derived from the index location when unset.
    pub fn manifest_location(&self) -> String {
        self.manifest
            .clone()
            .unwrap_or_else(|| format!("{}.manifest.json", self.index))
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// HuggingFace repository of the sentence-transformer model
    #[serde(default = "default_model_repo")]
    pub model_repo: String,

    /// Output dimension of the model
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Chunk size used when embedding many texts at once
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Model file cache; defaults to the platform cache dir
    #[serde(default)]
    pub cache_dir: Option<String>,
}

fn default_model_repo() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_dimension() -> usize {
    384
}

fn default_batch_size() -> usize {
    32
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_repo: default_model_repo(),
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            cache_dir: None,
        }
    }
}

/// Query handling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Number of neighbours fetched per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Longest accepted query, in characters
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,

    /// Upper bound on one request, end to end
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_top_k() -> usize {
    3
}

fn default_max_query_chars() -> usize {
    500
}

fn default_request_timeout() -> u64 {
    90
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_query_chars: default_max_query_chars(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Language detection and translation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageSettings {
    /// Language the index and prompts are written in
    #[serde(default = "default_working_language")]
    pub working_language: String,

    /// Additional language served through translation (e.g. "ta")
    #[serde(default = "default_secondary_language")]
    pub secondary_language: Option<String>,

    /// LibreTranslate-compatible endpoint; translation is disabled when unset
    #[serde(default)]
    pub translator_url: Option<String>,

    /// API key for the translation endpoint, if it requires one
    #[serde(default)]
    pub translator_api_key: Option<String>,

    /// Per-call timeout in seconds
    #[serde(default = "default_language_timeout")]
    pub timeout_secs: u64,
}

fn default_working_language() -> String {
    "en".to_string()
}

fn default_secondary_language() -> Option<String> {
    Some("ta".to_string())
}

fn default_language_timeout() -> u64 {
    10
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            working_language: default_working_language(),
            secondary_language: default_secondary_language(),
            translator_url: None,
            translator_api_key: None,
            timeout_secs: default_language_timeout(),
        }
    }
}

/// How answers are produced from retrieved records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponderMode {
    /// Deterministic markup rendering
    #[default]
    Template,
    /// `{title, causes, treatment}` triple from the closest record
    Structured,
    /// Prompted rewrite through a language model
    Generative,
}

/// Responder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponderSettings {
    /// Response strategy
    #[serde(default)]
    pub mode: ResponderMode,

    /// Provider name ("mistral", "openai", "gemini")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name (e.g., "open-mistral-7b", "gemini-pro")
    #[serde(default = "default_model")]
    pub model: String,

    /// API key (usually supplied through the environment)
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-call timeout in seconds
    #[serde(default = "default_responder_timeout")]
    pub timeout_secs: u64,

    /// Maximum attempts per generation call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_provider() -> String {
    "mistral".to_string()
}

fn default_model() -> String {
    "open-mistral-7b".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_responder_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

impl Default for ResponderSettings {
    fn default() -> Self {
        Self {
            mode: ResponderMode::default(),
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            api_base_url: None,
            temperature: default_temperature(),
            timeout_secs: default_responder_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl ResponderSettings {
    /// Provider-specific environment variable holding the API key.
    pub fn provider_key_var(&self) -> &'static str {
        match self.provider.as_str() {
            "gemini" => "GEMINI_API",
            "openai" => "OPENAI_API_KEY",
            _ => "MISTRAL_API_KEY",
        }
    }

    /// Configured key, falling back to the provider's environment variable.
    ///
    /// A blank value in either place counts as unset.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|var| std::env::var(var).ok())
    }

    fn resolve_api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        let non_blank = |key: &String| !key.trim().is_empty();
        self.api_key
            .clone()
            .filter(non_blank)
            .or_else(|| lookup(self.provider_key_var()).filter(non_blank))
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub artifacts: ArtifactSettings,

    #[serde(default)]
    pub embedding: EmbeddingSettings,

    #[serde(default)]
    pub retrieval: RetrievalSettings,

    #[serde(default)]
    pub language: LanguageSettings,

    #[serde(default)]
    pub responder: ResponderSettings,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/vet-assist/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (VET_*, `__` between nested keys)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, VetError> {
        let config_dir = ProjectDirs::from("", "", "vet-assist")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())
            .map_err(|e| VetError::Config(e.to_string()))?
            .set_default("retrieval.top_k", default_top_k() as i64)
            .map_err(|e| VetError::Config(e.to_string()))?
            .set_default("responder.provider", default_provider())
            .map_err(|e| VetError::Config(e.to_string()))?
            .set_default("responder.model", default_model())
            .map_err(|e| VetError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // VET_RESPONDER__MODE=generative, VET_ARTIFACTS__INDEX=https://..., etc.
        builder = builder.add_source(
            Environment::with_prefix("VET")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| VetError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| VetError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> Result<(), VetError> {
        if self.retrieval.top_k == 0 {
            return Err(VetError::Config("retrieval.top_k must be > 0".to_string()));
        }
        if self.retrieval.max_query_chars == 0 {
            return Err(VetError::Config(
                "retrieval.max_query_chars must be > 0".to_string(),
            ));
        }
        if self.embedding.dimension == 0 {
            return Err(VetError::Config(
                "embedding.dimension must be > 0".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(VetError::Config(
                "embedding.batch_size must be > 0".to_string(),
            ));
        }
        if self.responder.model.trim().is_empty() {
            return Err(VetError::Config("responder.model cannot be empty".to_string()));
        }
        if self.responder.max_retries == 0 {
            return Err(VetError::Config(
                "responder.max_retries must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
