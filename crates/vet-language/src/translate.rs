//! Translation.

use async_trait::async_trait;

use crate::error::LanguageError;
use crate::tag::LanguageTag;

/// Outcome of a translation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// The backend produced a translation.
    Translated(String),
    /// The input is returned unchanged.
    Passthrough { text: String, reason: String },
}

impl Translation {
    /// The text to use, translated or not.
    pub fn text(&self) -> &str {
        match self {
            Translation::Translated(text) => text,
            Translation::Passthrough { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Translation::Translated(text) => text,
            Translation::Passthrough { text, .. } => text,
        }
    }

    pub fn is_translated(&self) -> bool {
        matches!(self, Translation::Translated(_))
    }
}


/// How the backend should treat the text it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    /// Tags are preserved; only text content is translated.
    Html,
}

impl TextFormat {
    /// Wire name used by LibreTranslate-compatible services.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextFormat::Plain => "text",
            TextFormat::Html => "html",
        }
    }
}

/// Machine translation backend.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn translate(
        &self,
        text: &str,
        source: &LanguageTag,
        target: &LanguageTag,
        format: TextFormat,
    ) -> Result<String, LanguageError>;
}
