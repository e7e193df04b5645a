//! Per-request answer pipeline.
//!
//! validate -> detect/translate in -> retrieve -> compose -> translate out,
//! run in that order under one request timeout.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};
use vet_language::{LanguageTag, TextFormat};
use vet_responder::{Answer, StructuredAnswer};
use vet_types::ContentRecord;

use crate::context::SystemContext;
use crate::error::QueryError;

/// Answers queries against a loaded [`SystemContext`].
#[derive(Clone)]
pub struct AnswerPipeline {
    context: Arc<SystemContext>,
}

impl AnswerPipeline {
    pub fn new(context: Arc<SystemContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<SystemContext> {
        &self.context
    }

    /// Trim and check a raw query.
    pub fn validate(&self, query: &str) -> Result<String, QueryError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        let max = self.context.settings().retrieval.max_query_chars;
        let chars = trimmed.chars().count();
        if chars > max {
            return Err(QueryError::QueryTooLong { max, actual: chars });
        }
        Ok(trimmed.to_string())
    }

    /// Answer with the configured `top_k`.
    pub async fn answer(&self, query: &str) -> Result<Answer, QueryError> {
        let k = self.context.settings().retrieval.top_k;
        self.answer_with_k(query, k).await
    }

    /// Answer using the `k` closest records.
    pub async fn answer_with_k(&self, query: &str, k: usize) -> Result<Answer, QueryError> {
        let query = self.validate(query)?;
        let limit = Duration::from_secs(self.context.settings().retrieval.request_timeout_secs);

        let result = match tokio::time::timeout(limit, self.run(query, k)).await {
            Ok(result) => result,
            Err(_) => Err(QueryError::Unavailable(format!(
                "request exceeded {}s",
                limit.as_secs()
            ))),
        };

        if let Err(e) = &result {
            error!(error = %e, "Query failed");
        }
        result
    }

    /// Answer, or the user-facing error message.
    pub async fn respond(&self, query: &str) -> String {
        match self.answer(query).await {
            Ok(answer) => answer.to_plain_text(),
            Err(e) => e.user_message().to_string(),
        }
    }

    async fn run(&self, query: String, k: usize) -> Result<Answer, QueryError> {
        let bridge = self.context.bridge();
        let inbound = bridge.to_working(&query).await;
        debug!(
            detection = ?inbound.detection,
            translated = inbound.translated,
            "Prepared query"
        );

        let retriever = self.context.retriever().clone();
        let text = inbound.text.clone();
        let retrieved = tokio::task::spawn_blocking(move || retriever.retrieve(&text, k))
            .await
            .map_err(|e| QueryError::Unavailable(format!("retrieval task failed: {}", e)))??;

        info!(k = k, found = retrieved.len(), "Retrieved records");
        let records: Vec<ContentRecord> = retrieved.into_iter().map(|r| r.record).collect();

        let answer = self
            .context
            .responder()
            .compose(&inbound.text, &records)
            .await;

        Ok(self.localize(answer, &inbound.reply_language).await)
    }

    /// Translate a working-language answer for the user.
    async fn localize(&self, answer: Answer, target: &LanguageTag) -> Answer {
        let bridge = self.context.bridge();
        if target == bridge.working_language() {
            return answer;
        }

        let format = if self.context.responder().renders_html() {
            TextFormat::Html
        } else {
            TextFormat::Plain
        };

        match answer {
            Answer::Text(text) => Answer::Text(bridge.from_working_as(&text, target, format).await),
            Answer::Structured(s) => {
                let mut out = StructuredAnswer {
                    title: bridge.from_working(&s.title, target).await,
                    ..Default::default()
                };
                for cause in &s.causes {
                    out.causes.push(bridge.from_working(cause, target).await);
                }
                for step in &s.treatment {
                    out.treatment.push(bridge.from_working(step, target).await);
                }
                Answer::Structured(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;
    use vet_embeddings::HashEmbedder;
    use vet_language::LanguageBridge;
    use vet_responder::{
        GenerativeResponder, Generator, GeneratorError, MockGenerator, Responder,
        TemplateResponder, NO_RESULTS_MESSAGE,
    };
    use vet_types::Settings;
    use vet_vector::{ArtifactPaths, BuildConfig, IndexBuilder};

    const DIM: usize = 64;

    fn kb() -> Vec<ContentRecord> {
        vec![
            ContentRecord::new("Foot and Mouth Disease", "Cattle")
                .with_symptoms(vec!["blisters on hooves", "fever", "drooling"])
                .with_treatment("Apply neem paste"),
            ContentRecord::new("Bloat", "Goat")
                .with_symptoms(vec!["swollen abdomen", "restlessness"])
                .with_treatment("Drench with mustard oil"),
        ]
    }

    async fn context(
        dir: &std::path::Path,
        records: Vec<ContentRecord>,
        responder: Arc<dyn Responder>,
        configure: impl FnOnce(&mut Settings),
    ) -> Arc<SystemContext> {
        let paths = ArtifactPaths::in_dir(dir);
        IndexBuilder::new(Arc::new(HashEmbedder::new(DIM)), BuildConfig::default())
            .build_to(records, &paths)
            .unwrap();

        let mut settings = Settings::default();
        settings.artifacts.index = paths.index.display().to_string();
        settings.artifacts.content = paths.content.display().to_string();
        configure(&mut settings);

        let bridge = LanguageBridge::from_settings(&settings.language).unwrap();
        Arc::new(
            SystemContext::from_parts(&settings, Arc::new(HashEmbedder::new(DIM)), bridge, responder)
                .await
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_template_answer() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), kb(), Arc::new(TemplateResponder::new()), |_| {}).await;
        let pipeline = AnswerPipeline::new(ctx);

        let answer = pipeline
            .answer_with_k("blisters on hooves and fever", 1)
            .await
            .unwrap();
        match answer {
            Answer::Text(text) => assert!(text.starts_with("<b>Foot and Mouth Disease</b>")),
            other => panic!("unexpected answer: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_validation() {
        let temp = TempDir::new().unwrap();
        let ctx = context(temp.path(), kb(), Arc::new(TemplateResponder::new()), |s| {
            s.retrieval.max_query_chars = 10
        })
        .await;
        let pipeline = AnswerPipeline::new(ctx);

        assert!(matches!(
            pipeline.answer("   ").await,
            Err(QueryError::EmptyQuery)
        ));
        assert!(matches!(
            pipeline.answer("this query is too long").await,
            Err(QueryError::QueryTooLong { max: 10, .. })
        ));
        assert_eq!(
            pipeline.respond("").await,
            "Please enter a valid query (max 500 characters)."
        );
    }

    #[tokio::test]
    async fn test_empty_index_generative_skips_model() {
        let temp = TempDir::new().unwrap();
        let generator = Arc::new(MockGenerator::new("unused"));
        let ctx = context(
            temp.path(),
            Vec::new(),
            Arc::new(GenerativeResponder::new(generator.clone())),
            |_| {},
        )
        .await;

        let answer = AnswerPipeline::new(ctx).answer("cow fever").await.unwrap();
        assert_eq!(answer, Answer::Text(NO_RESULTS_MESSAGE.to_string()));
        assert_eq!(generator.call_count(), 0);
    }

    struct SlowGenerator;

    #[async_trait]
    impl Generator for SlowGenerator {
        fn model(&self) -> &str {
            "slow"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, GeneratorError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("late".to_string())
        }
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let temp = TempDir::new().unwrap();
        let ctx = context(
            temp.path(),
            kb(),
            Arc::new(GenerativeResponder::new(Arc::new(SlowGenerator))),
            |s| s.retrieval.request_timeout_secs = 1,
        )
        .await;
        let pipeline = AnswerPipeline::new(ctx);

        let err = pipeline.answer("fever").await.unwrap_err();
        assert!(matches!(err, QueryError::Unavailable(_)));
        assert_eq!(
            err.user_message(),
            "Oops! Something went wrong. Please try again later."
        );
    }
}
