//! # vet-responder
//!
//! Turns retrieved knowledge-base records into the final answer.
//!
//! Three strategies implement [`Responder`]:
//! - [`TemplateResponder`]: deterministic markup, no external calls
//! - [`StructuredResponder`]: `{title, causes, treatment}` from the closest record
//! - [`GenerativeResponder`]: prompted rewrite through a [`Generator`]
//!
//! The strategy is chosen once from configuration and held fixed, so every
//! answer from one deployment has the same shape.

mod answer;
mod api;
mod error;
mod generative;
mod mock;
mod structured;
mod template;

pub use answer::{Answer, StructuredAnswer, GENERATION_FAILED_MESSAGE, NO_RESULTS_MESSAGE};
pub use api::{ApiFlavor, ApiGenerator, ApiGeneratorConfig};
pub use error::GeneratorError;
pub use generative::GenerativeResponder;
pub use mock::MockGenerator;
pub use structured::StructuredResponder;
pub use template::TemplateResponder;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use vet_types::{ContentRecord, ResponderMode, ResponderSettings};

/// Language-model text generation.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Model identifier, for logs.
    fn model(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

/// Answer composition strategy.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Strategy name, for logs.
    fn name(&self) -> &str;

    /// Whether text answers are HTML markup rather than plain text.
    fn renders_html(&self) -> bool {
        false
    }

    /// Compose an answer from records ordered closest first.
    ///
    /// Never fails: backend errors become a user-safe message and are logged.
    async fn compose(&self, query: &str, records: &[ContentRecord]) -> Answer;
}

/// Build the configured responder.
///
/// Generative mode requires a credential; its absence is reported here so that
/// it fails at startup rather than on the first request.
pub fn responder_from_settings(
    settings: &ResponderSettings,
) -> Result<Arc<dyn Responder>, GeneratorError> {
    let responder: Arc<dyn Responder> = match settings.mode {
        ResponderMode::Template => Arc::new(TemplateResponder::new()),
        ResponderMode::Structured => Arc::new(StructuredResponder::new()),
        ResponderMode::Generative => {
            let config = ApiGeneratorConfig::from_settings(settings)?;
            let generator = ApiGenerator::new(config)?;
            Arc::new(GenerativeResponder::new(Arc::new(generator)))
        }
    };
    info!(mode = responder.name(), "Responder ready");
    Ok(responder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_default() {
        let responder = responder_from_settings(&ResponderSettings::default()).unwrap();
        assert_eq!(responder.name(), "template");
        assert!(responder.renders_html());
    }

    #[test]
    fn test_structured_mode() {
        let settings = ResponderSettings {
            mode: ResponderMode::Structured,
            ..Default::default()
        };
        let responder = responder_from_settings(&settings).unwrap();
        assert_eq!(responder.name(), "structured");
        assert!(!responder.renders_html());
    }

    #[test]
    fn test_generative_requires_key() {
        // A blank key defers to the environment
        if std::env::var("MISTRAL_API_KEY").is_ok() {
            return;
        }
        let settings = ResponderSettings {
            mode: ResponderMode::Generative,
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            responder_from_settings(&settings),
            Err(GeneratorError::MissingCredential(_))
        ));
    }

    #[test]
    fn test_generative_with_key() {
        let settings = ResponderSettings {
            mode: ResponderMode::Generative,
            api_key: Some("test-key".to_string()),
            ..Default::default()
        };
        assert_eq!(responder_from_settings(&settings).unwrap().name(), "generative");
    }
}
