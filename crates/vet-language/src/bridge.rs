//! Language bridge between users and the working language.
//!
//! The knowledge base and prompts are in one working language. Queries in the
//! configured secondary language are translated in, and answers translated
//! back out. Every failure degrades to detection defaults or passthrough; the
//! bridge never returns an error to its caller.

use std::sync::Arc;

use tracing::{debug, warn};
use vet_types::LanguageSettings;

use crate::detect::{Detection, LanguageDetector, ScriptDetector};
use crate::error::LanguageError;
use crate::http::{HttpTranslator, HttpTranslatorConfig};
use crate::tag::LanguageTag;
use crate::translate::{TextFormat, Translation, Translator};

/// A query prepared for the working language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundQuery {
    /// Text to embed and answer
    pub text: String,
    /// Language the answer should be returned in
    pub reply_language: LanguageTag,
    pub detection: Detection,
    /// Whether `text` differs from the user's input because of translation
    pub translated: bool,
}

/// Detect, translate in, translate out.
pub struct LanguageBridge {
    detectors: Vec<Arc<dyn LanguageDetector>>,
    translator: Option<Arc<dyn Translator>>,
    working: LanguageTag,
    secondary: Option<LanguageTag>,
}

impl LanguageBridge {
    pub fn new(
        detectors: Vec<Arc<dyn LanguageDetector>>,
        translator: Option<Arc<dyn Translator>>,
        working: LanguageTag,
        secondary: Option<LanguageTag>,
    ) -> Self {
        Self {
            detectors,
            translator,
            working,
            secondary,
        }
    }

    /// Working-language only: script detection, no translation.
    pub fn monolingual(working: LanguageTag) -> Self {
        Self::new(
            vec![Arc::new(ScriptDetector::new(working.clone()))],
            None,
            working,
            None,
        )
    }

    /// Build from settings.
    ///
    /// With a translator URL the HTTP service is tried first for detection and
    /// the script detector is the fallback. Without one, translation is
    /// disabled and queries are answered as written.
    pub fn from_settings(settings: &LanguageSettings) -> Result<Self, LanguageError> {
        let working = LanguageTag::new(&settings.working_language);
        let secondary = settings
            .secondary_language
            .as_deref()
            .map(LanguageTag::new)
            .filter(|tag| !tag.is_empty() && *tag != working);

        let script: Arc<dyn LanguageDetector> = Arc::new(ScriptDetector::new(working.clone()));

        match HttpTranslatorConfig::from_settings(settings) {
            Some(config) => {
                let http = Arc::new(HttpTranslator::new(config)?);
                let detectors: Vec<Arc<dyn LanguageDetector>> = vec![http.clone(), script];
                let translator: Arc<dyn Translator> = http;
                Ok(Self::new(detectors, Some(translator), working, secondary))
            }
            None => Ok(Self::new(vec![script], None, working, secondary)),
        }
    }

    pub fn working_language(&self) -> &LanguageTag {
        &self.working
    }

    pub fn secondary_language(&self) -> Option<&LanguageTag> {
        self.secondary.as_ref()
    }

    /// Detect the language of `text`; falls back to the working language.
    pub async fn detect(&self, text: &str) -> Detection {
        if text.trim().is_empty() {
            return self.defaulted("empty input".to_string());
        }

        let mut last_reason = "no detector configured".to_string();
        for detector in &self.detectors {
            match detector.detect(text).await {
                Ok(tag) if !tag.is_empty() => {
                    debug!(detector = detector.name(), language = %tag, "Detected language");
                    return Detection::Detected(tag);
                }
                Ok(_) => last_reason = format!("{} returned an empty tag", detector.name()),
                Err(e) => {
                    warn!(detector = detector.name(), error = %e, "Language detection failed");
                    last_reason = format!("{}: {}", detector.name(), e);
                }
            }
        }
        self.defaulted(last_reason)
    }

    fn defaulted(&self, reason: String) -> Detection {
        Detection::Defaulted {
            language: self.working.clone(),
            reason,
        }
    }

    /// Translate plain `text`; returns it unchanged when translation is not possible.
    pub async fn translate(
        &self,
        text: &str,
        source: &LanguageTag,
        target: &LanguageTag,
    ) -> Translation {
        self.translate_as(text, source, target, TextFormat::Plain)
            .await
    }

    /// Like [`LanguageBridge::translate`] for text in the given format.
    pub async fn translate_as(
        &self,
        text: &str,
        source: &LanguageTag,
        target: &LanguageTag,
        format: TextFormat,
    ) -> Translation {
        let passthrough = |reason: &str| Translation::Passthrough {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        if source == target {
            return passthrough("source and target are the same");
        }
        if text.trim().is_empty() {
            return passthrough("empty input");
        }
        let Some(translator) = &self.translator else {
            return passthrough("no translator configured");
        };

        match translator.translate(text, source, target, format).await {
            Ok(out) if !out.trim().is_empty() => {
                debug!(from = %source, to = %target, "Translated text");
                Translation::Translated(out)
            }
            Ok(_) => {
                warn!(from = %source, to = %target, "Translator returned empty text");
                passthrough("empty translation")
            }
            Err(e) => {
                warn!(from = %source, to = %target, error = %e, "Translation failed");
                passthrough(&e.to_string())
            }
        }
    }

    /// Prepare a user query for the working language.
    ///
    /// Only the secondary language is translated; any other detected language
    /// is processed as written and answered in the working language.
    pub async fn to_working(&self, query: &str) -> InboundQuery {
        let detection = self.detect(query).await;
        let language = detection.language().clone();

        if Some(&language) == self.secondary.as_ref() {
            let translation = self.translate(query, &language, &self.working).await;
            return InboundQuery {
                translated: translation.is_translated(),
                text: translation.into_text(),
                reply_language: language,
                detection,
            };
        }

        InboundQuery {
            text: query.to_string(),
            reply_language: self.working.clone(),
            detection,
            translated: false,
        }
    }

    /// Translate a plain working-language answer into `target`.
    pub async fn from_working(&self, answer: &str, target: &LanguageTag) -> String {
        self.from_working_as(answer, target, TextFormat::Plain).await
    }

    /// Translate a working-language answer in `format` into `target`.
    pub async fn from_working_as(
        &self,
        answer: &str,
        target: &LanguageTag,
        format: TextFormat,
    ) -> String {
        self.translate_as(answer, &self.working, target, format)
            .await
            .into_text()
    }
}
