//! `{title, causes, treatment}` answers from the closest record.

use async_trait::async_trait;
use vet_types::ContentRecord;

use crate::answer::{Answer, StructuredAnswer, NO_RESULTS_MESSAGE};
use crate::Responder;

/// Builds a [`StructuredAnswer`] from the best-ranked record only.
#[derive(Debug, Clone, Default)]
pub struct StructuredResponder;

impl StructuredResponder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(records: &[ContentRecord]) -> StructuredAnswer {
        let Some(best) = records.first() else {
            return StructuredAnswer {
                title: NO_RESULTS_MESSAGE.to_string(),
                ..Default::default()
            };
        };

        let title = match best.disease.trim() {
            "" => "No Title".to_string(),
            name if best.animal.trim().is_empty() => name.to_string(),
            name => format!("{} ({})", name, best.animal.trim()),
        };

        StructuredAnswer {
            title,
            causes: best.cause.items().into_iter().map(String::from).collect(),
            treatment: best.treatment.items().into_iter().map(String::from).collect(),
        }
    }
}

#[async_trait]
impl Responder for StructuredResponder {
    fn name(&self) -> &str {
        "structured"
    }

    async fn compose(&self, _query: &str, records: &[ContentRecord]) -> Answer {
        Answer::Structured(Self::build(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_uses_first_record() {
        let records = vec![
            ContentRecord::new("Bloat", "Goat")
                .with_cause("Grazing wet legumes")
                .with_treatment(vec!["Drench with mustard oil", "Walk the animal"]),
            ContentRecord::new("Mastitis", "Cow").with_cause("Bacterial infection"),
        ];

        assert_eq!(
            StructuredResponder::build(&records),
            StructuredAnswer {
                title: "Bloat (Goat)".to_string(),
                causes: vec!["Grazing wet legumes".to_string()],
                treatment: vec![
                    "Drench with mustard oil".to_string(),
                    "Walk the animal".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let answer = StructuredResponder::build(&[ContentRecord::default()]);
        assert_eq!(answer.title, "No Title");
        assert!(answer.causes.is_empty());
        assert!(answer.treatment.is_empty());
    }

    #[tokio::test]
    async fn test_empty_retrieval() {
        let answer = StructuredResponder::new().compose("q", &[]).await;
        match answer {
            Answer::Structured(s) => {
                assert_eq!(s.title, NO_RESULTS_MESSAGE);
                assert!(s.causes.is_empty());
            }
            other => panic!("unexpected answer shape: {:?}", other),
        }
    }
}
