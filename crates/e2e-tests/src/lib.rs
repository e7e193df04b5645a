//! End-to-end test infrastructure for vet-assist.
//!
//! Provides a shared TestHarness that writes a small knowledge base to a temp
//! directory and loads a [`SystemContext`] over it, using the hashing embedder
//! so no model download is needed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::SeedableRng;

use vet_embeddings::{Embedding, EmbeddingError, EmbeddingModel, HashEmbedder, ModelInfo};
use vet_language::LanguageBridge;
use vet_responder::Responder;
use vet_service::{AnswerPipeline, SystemContext};
use vet_types::{ContentRecord, Settings};
use vet_vector::{ArtifactPaths, BuildConfig, IndexBuilder};

/// Embedding dimension used by every harness.
pub const DIM: usize = 128;

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Where the index, content and manifest were written
    pub paths: ArtifactPaths,
    /// Settings pointing at `paths`
    pub settings: Settings,
    /// Embedder handed to the context; counts query embeddings
    pub embedder: Arc<CountingEmbedder>,
}

impl TestHarness {
    /// Build artifacts for `records` and default settings pointing at them.
    pub fn new(records: Vec<ContentRecord>) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let paths = ArtifactPaths::in_dir(temp_dir.path());

        IndexBuilder::new(Arc::new(HashEmbedder::new(DIM)), BuildConfig::default())
            .build_to(records, &paths)
            .expect("Failed to build test index");

        let mut settings = Settings::default();
        settings.artifacts.index = paths.index.display().to_string();
        settings.artifacts.content = paths.content.display().to_string();
        settings.artifacts.cache_dir = temp_dir.path().join("cache").display().to_string();

        Self {
            _temp_dir: temp_dir,
            paths,
            settings,
            embedder: Arc::new(CountingEmbedder::new(DIM)),
        }
    }

    /// Load a context over the harness artifacts with the given responder.
    pub async fn context(&self, responder: Arc<dyn Responder>) -> Arc<SystemContext> {
        let bridge =
            LanguageBridge::from_settings(&self.settings.language).expect("Failed to build bridge");
        let embedder: Arc<dyn EmbeddingModel> = self.embedder.clone();
        let context = SystemContext::from_parts(&self.settings, embedder, bridge, responder)
            .await
            .expect("Failed to load system context");
        Arc::new(context)
    }

    /// Shortcut for a pipeline over [`TestHarness::context`].
    pub async fn pipeline(&self, responder: Arc<dyn Responder>) -> AnswerPipeline {
        AnswerPipeline::new(self.context(responder).await)
    }
}

/// Hashing embedder that counts calls to `embed`.
pub struct CountingEmbedder {
    inner: HashEmbedder,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            inner: HashEmbedder::new(dimension),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingModel for CountingEmbedder {
    fn info(&self) -> &ModelInfo {
        self.inner.info()
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text)
    }
}

/// Six-record knowledge base; Foot and Mouth Disease sits at id 4.
pub fn sample_records() -> Vec<ContentRecord> {
    vec![
        ContentRecord::new("Bloat", "Goat")
            .with_definition("Gas build-up in the rumen")
            .with_symptoms(vec!["swollen left abdomen", "restlessness"])
            .with_treatment("Drench with mustard oil")
            .with_ingredients(vec!["mustard oil", "turmeric"]),
        ContentRecord::new("Ringworm", "Dog")
            .with_symptoms(vec!["circular hair loss", "scaly skin patches"])
            .with_treatment("Apply turmeric and neem paste"),
        ContentRecord::new("Mastitis", "Cattle")
            .with_symptoms(vec!["swollen udder", "clotted milk"])
            .with_treatment(vec!["Apply aloe vera gel", "Feed turmeric with jaggery"]),
        ContentRecord::new("Newcastle Disease", "Poultry")
            .with_symptoms(vec!["twisted neck", "green diarrhoea"])
            .with_treatment("Give tulsi leaf water"),
        ContentRecord::new("Foot and Mouth Disease", "Cattle")
            .with_definition("Viral infection of cloven-hoofed animals")
            .with_symptoms(vec!["blisters on hooves", "blisters in mouth", "fever"])
            .with_cause("Aphthovirus")
            .with_treatment(vec!["Wash foot lesions with neem water", "Apply honey in the mouth"])
            .with_ingredients(vec!["neem leaves", "honey", "turmeric"]),
        ContentRecord::new("Tick Infestation", "Cattle")
            .with_symptoms(vec!["itching", "visible ticks"])
            .with_treatment("Spray custard apple leaf extract"),
    ]
}

/// `count` generated records with a reproducible, shuffled vocabulary.
pub fn generated_records(count: usize, seed: u64) -> Vec<ContentRecord> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut words = vec![
        "fever", "cough", "limping", "swelling", "diarrhoea", "lesions", "drooling",
        "weakness", "bleeding", "itching", "wounds", "discharge",
    ];
    (0..count)
        .map(|i| {
            words.shuffle(&mut rng);
            ContentRecord::new(format!("Condition {}", i), "Cattle")
                .with_symptoms(words[..3].iter().map(|w| w.to_string()).collect::<Vec<_>>())
        })
        .collect()
}
