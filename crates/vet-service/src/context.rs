//! Process-wide system context.
//!
//! Holds the embedder, index, content store, language bridge and responder.
//! Everything is loaded once and shared read-only across requests.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::OnceCell;
use tracing::info;

use vet_embeddings::{CandleEmbedder, EmbeddingModel, ModelCache};
use vet_language::LanguageBridge;
use vet_responder::{responder_from_settings, Responder};
use vet_types::Settings;
use vet_vector::{
    ContentStore, HnswConfig, HnswIndex, IndexManifest, Retriever, VectorError, VectorIndex,
    CONTENT_FILE, INDEX_FILE,
};

use crate::artifacts::{ArtifactFetcher, ArtifactSource};
use crate::error::InitError;

/// Loaded, validated service state.
pub struct SystemContext {
    settings: Settings,
    retriever: Retriever,
    bridge: LanguageBridge,
    responder: Arc<dyn Responder>,
    manifest: IndexManifest,
}

impl SystemContext {
    /// Load everything named by `settings`.
    ///
    /// The responder is built first so a missing credential fails before the
    /// model and artifacts are fetched.
    pub async fn initialize(settings: &Settings) -> Result<Self, InitError> {
        let responder = responder_from_settings(&settings.responder)?;
        let bridge = LanguageBridge::from_settings(&settings.language)?;

        let embedding = settings.embedding.clone();
        let embedder = tokio::task::spawn_blocking(move || {
            let cache =
                ModelCache::from_settings(embedding.cache_dir.as_deref(), embedding.model_repo);
            CandleEmbedder::load(&cache, embedding.dimension)
        })
        .await
        .map_err(|e| InitError::Task(e.to_string()))??;

        Self::from_parts(settings, Arc::new(embedder), bridge, responder).await
    }

    /// Like [`SystemContext::initialize`] with a caller-supplied embedder.
    pub async fn initialize_with_embedder(
        settings: &Settings,
        embedder: Arc<dyn EmbeddingModel>,
    ) -> Result<Self, InitError> {
        let responder = responder_from_settings(&settings.responder)?;
        let bridge = LanguageBridge::from_settings(&settings.language)?;
        Self::from_parts(settings, embedder, bridge, responder).await
    }

    /// Resolve and load artifacts, then validate them against `embedder`.
    pub async fn from_parts(
        settings: &Settings,
        embedder: Arc<dyn EmbeddingModel>,
        bridge: LanguageBridge,
        responder: Arc<dyn Responder>,
    ) -> Result<Self, InitError> {
        let artifacts = &settings.artifacts;
        let fetcher = ArtifactFetcher::new(
            &artifacts.cache_dir,
            Duration::from_secs(artifacts.download_timeout_secs),
        )?;

        let index_path = fetcher
            .resolve(&ArtifactSource::parse(&artifacts.index), INDEX_FILE)
            .await?;
        let content_path = fetcher
            .resolve(&ArtifactSource::parse(&artifacts.content), CONTENT_FILE)
            .await?;
        let manifest_path = fetcher
            .resolve(
                &ArtifactSource::parse(&artifacts.manifest_location()),
                "manifest.json",
            )
            .await?;

        let (manifest, index, store) = tokio::task::spawn_blocking(move || {
            let manifest = IndexManifest::load(&manifest_path)?;
            let config = HnswConfig::new(manifest.dimension).with_metric(manifest.metric);
            let index = HnswIndex::load(&index_path, config)?;
            let store = ContentStore::load(&content_path)?;
            Ok::<_, VectorError>((manifest, index, store))
        })
        .await
        .map_err(|e| InitError::Task(e.to_string()))??;

        manifest.validate(embedder.info(), &index)?;
        if store.len() != manifest.count {
            return Err(VectorError::Content(format!(
                "content file has {} records, manifest expects {}",
                store.len(),
                manifest.count
            ))
            .into());
        }

        info!(
            model = %manifest.model,
            vectors = index.len(),
            dim = manifest.dimension,
            responder = responder.name(),
            "System context ready"
        );

        let retriever = Retriever::new(embedder, Arc::new(index), Arc::new(store));
        Ok(Self {
            settings: settings.clone(),
            retriever,
            bridge,
            responder,
            manifest,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn bridge(&self) -> &LanguageBridge {
        &self.bridge
    }

    pub fn responder(&self) -> &Arc<dyn Responder> {
        &self.responder
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }
}

type Loader = Box<dyn Fn() -> BoxFuture<'static, Result<SystemContext, InitError>> + Send + Sync>;

/// Lazily initialized [`SystemContext`] shared by all requests.
///
/// Concurrent first callers wait on a single initialization. A failed
/// initialization is not cached; the next caller tries again.
pub struct SharedContext {
    cell: OnceCell<Arc<SystemContext>>,
    loader: Loader,
}

impl SharedContext {
    /// Initialize from settings on first use.
    pub fn new(settings: Settings) -> Self {
        let settings = Arc::new(settings);
        Self::with_loader(move || {
            let settings = settings.clone();
            async move { SystemContext::initialize(&settings).await }
        })
    }

    /// Initialize with a custom loader on first use.
    pub fn with_loader<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SystemContext, InitError>> + Send + 'static,
    {
        Self {
            cell: OnceCell::new(),
            loader: Box::new(move || Box::pin(loader())),
        }
    }

    /// Get the context, initializing it if needed.
    pub async fn get(&self) -> Result<Arc<SystemContext>, InitError> {
        self.cell
            .get_or_try_init(|| async { (self.loader)().await.map(Arc::new) })
            .await
            .cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}
