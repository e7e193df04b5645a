//! # vet-types
//!
//! Shared domain types for the veterinary answer service.
//!
//! This crate defines the data structures used throughout the system:
//! - Content records: one knowledge-base entry per disease/animal pair
//! - Field values: text fields that may be a single string or a list
//! - Settings: layered configuration for every component
//!
//! ## Usage
//!
//! ```rust
//! use vet_types::{ContentRecord, FieldValue};
//!
//! let record = ContentRecord::new("Foot and Mouth Disease", "Cattle")
//!     .with_symptoms(FieldValue::from(vec!["Fever", "Blisters"]));
//! assert_eq!(record.symptoms.items().len(), 2);
//! ```

pub mod config;
pub mod error;
pub mod record;

pub use config::{
    ArtifactSettings, EmbeddingSettings, LanguageSettings, ResponderMode, ResponderSettings,
    RetrievalSettings, Settings,
};
pub use error::VetError;
pub use record::{ContentRecord, FieldValue};
