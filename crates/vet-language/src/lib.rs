//! # vet-language
//!
//! Language detection and translation for the veterinary answer service.
//!
//! Queries in a configured secondary language (Tamil by default) are
//! translated into the working language before retrieval, and answers are
//! translated back. Detection and translation failures never fail a request:
//! they degrade to [`Detection::Defaulted`] and [`Translation::Passthrough`].

pub mod bridge;
pub mod detect;
pub mod error;
pub mod http;
pub mod tag;
pub mod translate;

pub use bridge::{InboundQuery, LanguageBridge};
pub use detect::{Detection, LanguageDetector, ScriptDetector};
pub use error::LanguageError;
pub use http::{HttpTranslator, HttpTranslatorConfig};
pub use tag::LanguageTag;
pub use translate::{TextFormat, Translation, Translator};
