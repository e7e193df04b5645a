//! Prompted answer generation over retrieved records.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};
use vet_types::ContentRecord;

use crate::answer::{Answer, GENERATION_FAILED_MESSAGE, NO_RESULTS_MESSAGE};
use crate::{Generator, Responder};

const CONTEXT_SEPARATOR: &str = "----------------------------";

/// Rewrites retrieved records into an answer through a [`Generator`].
pub struct GenerativeResponder {
    generator: Arc<dyn Generator>,
}

impl GenerativeResponder {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Serialize one record for the prompt.
    fn format_context(record: &ContentRecord) -> String {
        let mut lines = vec![
            format!("Disease: {}", non_empty(&record.disease, "Unknown")),
            format!("Affects: {}", non_empty(&record.animal, "Unknown")),
            format!(
                "Symptoms: {}",
                record.symptoms.joined_or(", ", "No symptoms provided")
            ),
        ];
        if !record.cause.is_empty() {
            lines.push(format!("Cause: {}", record.cause.joined(", ")));
        }
        lines.push(format!(
            "Ingredients: {}",
            record.ingredients.joined_or(", ", "No ingredients listed")
        ));
        lines.push(format!(
            "Treatment: {}",
            record.treatment.joined_or("; ", "No treatment available")
        ));
        lines.push(CONTEXT_SEPARATOR.to_string());
        lines.join("\n")
    }

    /// Build the generation prompt from the query and retrieved records.
    pub fn build_prompt(query: &str, records: &[ContentRecord]) -> String {
        let knowledge = records
            .iter()
            .map(Self::format_context)
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            r#"You are an expert veterinary assistant helping farmers treat animal diseases using herbal and traditional remedies.

User Query: {query}

Retrieved Veterinary Knowledge:
{knowledge}

Your Task: Based on the retrieved information, provide a well-structured response that clearly explains:
  - The disease name
  - Affected animals
  - Common symptoms
  - Suggested herbal ingredients
  - Treatment methods

Use a structured format in your response."#
        )
    }
}

fn non_empty<'a>(value: &'a str, default: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default
    } else {
        trimmed
    }
}

#[async_trait]
impl Responder for GenerativeResponder {
    fn name(&self) -> &str {
        "generative"
    }

    async fn compose(&self, query: &str, records: &[ContentRecord]) -> Answer {
        if records.is_empty() {
            info!("No records retrieved, skipping generation");
            return Answer::Text(NO_RESULTS_MESSAGE.to_string());
        }

        let prompt = Self::build_prompt(query, records);
        match self.generator.generate(&prompt).await {
            Ok(text) if !text.trim().is_empty() => Answer::Text(text),
            Ok(_) => {
                error!(model = self.generator.model(), "Generator returned empty output");
                Answer::Text(GENERATION_FAILED_MESSAGE.to_string())
            }
            Err(e) => {
                error!(model = self.generator.model(), error = %e, "Answer generation failed");
                Answer::Text(GENERATION_FAILED_MESSAGE.to_string())
            }
        }
    }
}
