//! Answer types and fixed user-facing messages.

use serde::{Deserialize, Serialize};

/// Returned when retrieval finds nothing.
pub const NO_RESULTS_MESSAGE: &str =
    "I'm sorry, I couldn't find relevant information for your query.";

/// Returned when answer generation fails. Never carries the cause.
pub const GENERATION_FAILED_MESSAGE: &str = "Oops! Something went wrong. Please try again later.";

/// `{title, causes, treatment}` answer shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StructuredAnswer {
    pub title: String,
    pub causes: Vec<String>,
    pub treatment: Vec<String>,
}

/// A composed answer. The variant is fixed per deployment by the responder mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    Structured(StructuredAnswer),
}

impl Answer {
    /// Plain-text rendering, e.g. for terminals.
    pub fn to_plain_text(&self) -> String {
        match self {
            Answer::Text(text) => text.clone(),
            Answer::Structured(s) => {
                let mut out = s.title.clone();
                if !s.causes.is_empty() {
                    out.push_str("\nCauses:");
                    for cause in &s.causes {
                        out.push_str(&format!("\n- {}", cause));
                    }
                }
                if !s.treatment.is_empty() {
                    out.push_str("\nTreatment:");
                    for step in &s.treatment {
                        out.push_str(&format!("\n- {}", step));
                    }
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_untagged() {
        let text = Answer::Text("hello".to_string());
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"hello\"");

        let structured = Answer::Structured(StructuredAnswer {
            title: "Bloat".to_string(),
            causes: vec!["Legumes".to_string()],
            treatment: vec![],
        });
        let json = serde_json::to_value(&structured).unwrap();
        assert_eq!(json["title"], "Bloat");
        assert_eq!(json["causes"][0], "Legumes");
    }

    #[test]
    fn test_plain_text() {
        let answer = Answer::Structured(StructuredAnswer {
            title: "Bloat".to_string(),
            causes: vec!["Legumes".to_string()],
            treatment: vec!["Walk the animal".to_string()],
        });
        assert_eq!(
            answer.to_plain_text(),
            "Bloat\nCauses:\n- Legumes\nTreatment:\n- Walk the animal"
        );
    }
}
