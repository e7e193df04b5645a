//! Language detection.

use async_trait::async_trait;

use crate::error::LanguageError;
use crate::tag::LanguageTag;

/// Outcome of detecting the language of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// A detector identified the language.
    Detected(LanguageTag),
    /// No detector could decide; the working language is assumed.
    Defaulted { language: LanguageTag, reason: String },
}

impl Detection {
    /// The language to act on, detected or assumed.
    pub fn language(&self) -> &LanguageTag {
        match self {
            Detection::Detected(tag) => tag,
            Detection::Defaulted { language, .. } => language,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Detection::Defaulted { .. })
    }
}

/// Something that can name the language of a text.
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn detect(&self, text: &str) -> Result<LanguageTag, LanguageError>;
}

/// Unicode script ranges and the language each one implies.
const SCRIPTS: &[(char, char, &str)] = &[
    ('\u{0900}', '\u{097F}', "hi"),
    ('\u{0980}', '\u{09FF}', "bn"),
    ('\u{0B80}', '\u{0BFF}', "ta"),
    ('\u{0C00}', '\u{0C7F}', "te"),
    ('\u{0C80}', '\u{0CFF}', "kn"),
    ('\u{0D00}', '\u{0D7F}', "ml"),
];

/// Offline detector based on the dominant Unicode script.
///
/// Covers the Indic scripts in `SCRIPTS`; text written mostly in Latin letters
/// is reported as the configured Latin-script language (English by default).
#[derive(Debug, Clone)]
pub struct ScriptDetector {
    latin: LanguageTag,
}

impl Default for ScriptDetector {
    fn default() -> Self {
        Self {
            latin: LanguageTag::english(),
        }
    }
}

impl ScriptDetector {
    pub fn new(latin: LanguageTag) -> Self {
        Self { latin }
    }

    /// Detect synchronously.
    pub fn detect_script(&self, text: &str) -> Result<LanguageTag, LanguageError> {
        let mut counts = vec![0usize; SCRIPTS.len()];
        let mut latin = 0usize;

        for c in text.chars() {
            if c.is_ascii_alphabetic() {
                latin += 1;
                continue;
            }
            if let Some(i) = SCRIPTS
                .iter()
                .position(|(lo, hi, _)| (*lo..=*hi).contains(&c))
            {
                counts[i] += 1;
            }
        }

        let best = counts
            .iter()
            .enumerate()
            .max_by_key(|(_, n)| **n)
            .filter(|(_, n)| **n > 0);

        match best {
            Some((i, n)) if *n >= latin => Ok(LanguageTag::new(SCRIPTS[i].2)),
            _ if latin > 0 => Ok(self.latin.clone()),
            _ => Err(LanguageError::NoSignal),
        }
    }
}

#[async_trait]
impl LanguageDetector for ScriptDetector {
    fn name(&self) -> &str {
        "script"
    }

    async fn detect(&self, text: &str) -> Result<LanguageTag, LanguageError> {
        self.detect_script(text)
    }
}
