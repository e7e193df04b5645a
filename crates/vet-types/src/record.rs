//! Knowledge-base records.
//!
//! A `ContentRecord` is one row of the curated veterinary dataset. Records are
//! keyed by their positional id (`"0".."N-1"`) in the content file written next
//! to the vector index, and are immutable once loaded.

use serde::{Deserialize, Serialize};

/// A text field that may hold a single string or an ordered list of strings.
///
/// Source data is inconsistent: some rows carry `"Fever, blisters"` while
/// others carry `["Fever", "Blisters"]`. Consumers should go through
/// [`FieldValue::items`] rather than matching on the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FieldValue {
    /// Single free-text value
    Text(String),
    /// Ordered list of values
    List(Vec<String>),
    /// Missing or null
    #[default]
    Empty,
}

impl FieldValue {
    /// Ordered, non-empty items of this field.
    pub fn items(&self) -> Vec<&str> {
        match self {
            FieldValue::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Vec::new()
                } else {
                    vec![trimmed]
                }
            }
            FieldValue::List(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect(),
            FieldValue::Empty => Vec::new(),
        }
    }

    /// True if the field carries no usable text.
    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Join items with the given separator.
    pub fn joined(&self, separator: &str) -> String {
        self.items().join(separator)
    }

    /// Join items, or return `default` when the field is empty.
    pub fn joined_or(&self, separator: &str, default: &str) -> String {
        if self.is_empty() {
            default.to_string()
        } else {
            self.joined(separator)
        }
    }

    /// Trim whitespace and drop blank entries.
    ///
    /// A blank text or an all-blank list collapses to `Empty`.
    pub fn normalized(&self) -> FieldValue {
        match self {
            FieldValue::Text(text) if !text.trim().is_empty() => {
                FieldValue::Text(text.trim().to_string())
            }
            FieldValue::List(_) => {
                let items: Vec<String> = self.items().into_iter().map(String::from).collect();
                if items.is_empty() {
                    FieldValue::Empty
                } else {
                    FieldValue::List(items)
                }
            }
            _ => FieldValue::Empty,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        FieldValue::List(values.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::List(values)
    }
}

/// One knowledge-base entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContentRecord {
    /// Disease name (older content files call this `title`)
    #[serde(default, alias = "title")]
    pub disease: String,

    /// Affected animal(s)
    #[serde(default)]
    pub animal: String,

    /// Short definition of the disease
    #[serde(default, skip_serializing_if = "FieldValue::is_empty")]
    pub definition: FieldValue,

    /// Cause of the disease
    #[serde(default, skip_serializing_if = "FieldValue::is_empty")]
    pub cause: FieldValue,

    /// Observed symptoms
    #[serde(default)]
    pub symptoms: FieldValue,

    /// Treatment steps
    #[serde(default)]
    pub treatment: FieldValue,

    /// Herbal ingredients used by the treatment
    #[serde(default)]
    pub ingredients: FieldValue,
}

impl ContentRecord {
    /// Create a record with a disease and animal and no other fields.
    pub fn new(disease: impl Into<String>, animal: impl Into<String>) -> Self {
        Self {
            disease: disease.into(),
            animal: animal.into(),
            ..Default::default()
        }
    }

    pub fn with_definition(mut self, definition: impl Into<FieldValue>) -> Self {
        self.definition = definition.into();
        self
    }

    pub fn with_cause(mut self, cause: impl Into<FieldValue>) -> Self {
        self.cause = cause.into();
        self
    }

    pub fn with_symptoms(mut self, symptoms: impl Into<FieldValue>) -> Self {
        self.symptoms = symptoms.into();
        self
    }

    pub fn with_treatment(mut self, treatment: impl Into<FieldValue>) -> Self {
        self.treatment = treatment.into();
        self
    }

    pub fn with_ingredients(mut self, ingredients: impl Into<FieldValue>) -> Self {
        self.ingredients = ingredients.into();
        self
    }

    /// Return a copy with trimmed names and normalized field values.
    ///
    /// Run once at ingestion so that consumers never see blank entries.
    pub fn normalized(&self) -> ContentRecord {
        ContentRecord {
            disease: self.disease.trim().to_string(),
            animal: self.animal.trim().to_string(),
            definition: self.definition.normalized(),
            cause: self.cause.normalized(),
            symptoms: self.symptoms.normalized(),
            treatment: self.treatment.normalized(),
            ingredients: self.ingredients.normalized(),
        }
    }

    /// Text that represents this record in embedding space.
    ///
    /// The same rendering must be used for every record in one index.
    pub fn embedding_text(&self) -> String {
        let mut text = format!(
            "Disease: {}. Animal: {}. Symptoms: {}. ",
            self.disease,
            self.animal,
            self.symptoms.joined(", ")
        );
        if !self.cause.is_empty() {
            text.push_str(&format!("Cause: {}. ", self.cause.joined(", ")));
        }
        text.push_str(&format!(
            "Treatment: {}. Ingredients: {}.",
            self.treatment.joined(", "),
            self.ingredients.joined(", ")
        ));
        text
    }
}
