//! Command implementations for vet-assist.
//!
//! Handles:
//! - ask: load the system context once and answer one or many questions
//! - build: embed a record file and write index artifacts
//! - inspect: report the shape of an artifact triple

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use vet_embeddings::{CandleEmbedder, ModelCache};
use vet_responder::Answer;
use vet_service::{AnswerPipeline, ArtifactFetcher, ArtifactSource, QueryError, SharedContext};
use vet_types::{ResponderMode, Settings};
use vet_vector::{
    inspect, manifest_path_for, read_records, ArtifactPaths, BuildConfig, IndexBuilder, Metric,
    CONTENT_FILE, INDEX_FILE,
};

/// Load settings and apply the global CLI overrides.
pub fn load_settings(config_path: Option<&str>, log_level: Option<&str>) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(level) = log_level {
        settings.log_level = level.to_string();
    }
    Ok(settings)
}

/// Initialize logging to stderr; `RUST_LOG` wins over the configured level.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Answer `query`, or every stdin line when `query` is empty.
pub async fn run_ask(
    mut settings: Settings,
    query: Vec<String>,
    top_k: Option<usize>,
    mode: Option<ResponderMode>,
    json: bool,
) -> Result<()> {
    if let Some(k) = top_k {
        settings.retrieval.top_k = k;
    }
    if let Some(mode) = mode {
        settings.responder.mode = mode;
    }
    settings.validate().context("Invalid configuration")?;

    let shared = SharedContext::new(settings);
    let context = shared
        .get()
        .await
        .context("Failed to initialize the answer service")?;
    let pipeline = AnswerPipeline::new(context);

    if !query.is_empty() {
        let failed = answer_one(&pipeline, &query.join(" "), json).await?;
        if failed {
            anyhow::bail!("query failed");
        }
        return Ok(());
    }

    info!("Reading questions from stdin");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        answer_one(&pipeline, &line, json).await?;
    }
    Ok(())
}

/// Print the answer or the user-facing error. Returns true on failure.
async fn answer_one(pipeline: &AnswerPipeline, query: &str, json: bool) -> Result<bool> {
    let result = pipeline.answer(query).await;
    let (line, failed) = render_result(&result, json)?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    Ok(failed)
}

/// Output line for one query, and whether it failed.
fn render_result(result: &Result<Answer, QueryError>, json: bool) -> Result<(String, bool)> {
    Ok(match (result, json) {
        (Ok(answer), true) => (serde_json::to_string(answer)?, false),
        (Ok(answer), false) => (answer.to_plain_text(), false),
        (Err(e), true) => (
            serde_json::json!({ "error": e.user_message() }).to_string(),
            true,
        ),
        (Err(e), false) => (e.user_message().to_string(), true),
    })
}

/// Embed `records` with the configured model and write artifacts to `out_dir`.
pub async fn run_build(
    settings: Settings,
    records: &str,
    out_dir: &str,
    batch_size: Option<usize>,
    metric: Metric,
) -> Result<()> {
    let records_path = PathBuf::from(records);
    let paths = ArtifactPaths::in_dir(Path::new(out_dir));
    let batch_size = batch_size.unwrap_or(settings.embedding.batch_size);
    let embedding = settings.embedding.clone();

    let manifest = tokio::task::spawn_blocking(move || -> Result<_> {
        let records = read_records(&records_path)
            .with_context(|| format!("Failed to read records from {}", records_path.display()))?;

        let cache = ModelCache::from_settings(embedding.cache_dir.as_deref(), embedding.model_repo);
        let embedder =
            CandleEmbedder::load(&cache, embedding.dimension).context("Failed to load model")?;

        let builder = IndexBuilder::new(Arc::new(embedder), BuildConfig { batch_size, metric });
        builder
            .build_to(records, &paths)
            .context("Failed to build index")
    })
    .await
    .context("Build task failed")??;

    println!(
        "Built index: {} records, dimension {}, metric {:?}, model {}",
        manifest.count, manifest.dimension, manifest.metric, manifest.model
    );
    Ok(())
}

/// Resolve the configured (or given) artifacts and print their shape.
pub async fn run_inspect(
    settings: Settings,
    index: Option<String>,
    content: Option<String>,
) -> Result<()> {
    let artifacts = &settings.artifacts;
    let index = index.unwrap_or_else(|| artifacts.index.clone());
    let content = content.unwrap_or_else(|| artifacts.content.clone());
    let manifest = match &artifacts.manifest {
        Some(location) => location.clone(),
        None => manifest_path_for(Path::new(&index)).display().to_string(),
    };

    let fetcher = ArtifactFetcher::new(
        &artifacts.cache_dir,
        Duration::from_secs(artifacts.download_timeout_secs),
    )?;
    let paths = ArtifactPaths {
        index: fetcher
            .resolve(&ArtifactSource::parse(&index), INDEX_FILE)
            .await?,
        content: fetcher
            .resolve(&ArtifactSource::parse(&content), CONTENT_FILE)
            .await?,
        manifest: fetcher
            .resolve(&ArtifactSource::parse(&manifest), "manifest.json")
            .await?,
    };

    let report = tokio::task::spawn_blocking(move || inspect(&paths))
        .await
        .context("Inspect task failed")?
        .context("Failed to read artifacts")?;

    println!("Model:      {}", report.manifest.model);
    println!("Metric:     {:?}", report.manifest.metric);
    println!("Dimension:  {}", report.index.dimension);
    println!("Vectors:    {}", report.index.vector_count);
    println!("Records:    {}", report.records);
    println!(
        "Consistent: {}",
        if report.is_consistent() { "yes" } else { "NO" }
    );

    if !report.is_consistent() {
        anyhow::bail!("index, content and manifest disagree");
    }
    Ok(())
}
