//! Deterministic markup rendering of retrieved records.

use async_trait::async_trait;
use vet_types::{ContentRecord, FieldValue};

use crate::answer::{Answer, NO_RESULTS_MESSAGE};
use crate::Responder;

const RECORD_SEPARATOR: &str = "<br><br>";
const BULLET: &str = "🟢";

/// Renders each record as a block of HTML-style markup.
#[derive(Debug, Clone, Default)]
pub struct TemplateResponder;

impl TemplateResponder {
    pub fn new() -> Self {
        Self
    }

    /// Markup for a single record. Missing fields render defaults.
    pub fn render_record(record: &ContentRecord) -> String {
        let title = if record.disease.trim().is_empty() {
            "No Title".to_string()
        } else {
            escape(record.disease.trim())
        };
        let definition = escape(&record.definition.joined_or(" ", "No Definition"));

        format!(
            "<b>{title}</b><br><br>\
             <b>Definition:</b> {definition}<br><br>\
             <b>Symptoms:</b><br>{symptoms}<br><br>\
             <b>Treatment:</b><br>{treatment}<br><br>\
             <b>Ingredients:</b><br>{ingredients}",
            symptoms = bullets(&record.symptoms),
            treatment = bullets(&record.treatment),
            ingredients = bullets(&record.ingredients),
        )
    }

    /// Markup for all records, closest first.
    pub fn render(records: &[ContentRecord]) -> String {
        if records.is_empty() {
            return NO_RESULTS_MESSAGE.to_string();
        }
        records
            .iter()
            .map(Self::render_record)
            .collect::<Vec<_>>()
            .join(RECORD_SEPARATOR)
    }
}

fn bullets(value: &FieldValue) -> String {
    value
        .items()
        .into_iter()
        .map(|item| format!("{} {}", BULLET, escape(item)))
        .collect::<Vec<_>>()
        .join("<br>")
}

/// Minimal HTML escaping for field text.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[async_trait]
impl Responder for TemplateResponder {
    fn name(&self) -> &str {
        "template"
    }

    fn renders_html(&self) -> bool {
        true
    }

    async fn compose(&self, _query: &str, records: &[ContentRecord]) -> Answer {
        Answer::Text(Self::render(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_full_record() {
        let record = ContentRecord::new("Foot and Mouth Disease", "Cattle")
            .with_definition("Viral disease of cloven-hoofed animals")
            .with_symptoms(vec!["Fever", "Blisters"])
            .with_treatment("Wash lesions with neem water")
            .with_ingredients(vec!["Neem", "Turmeric"]);

        assert_eq!(
            TemplateResponder::render_record(&record),
            "<b>Foot and Mouth Disease</b><br><br>\
             <b>Definition:</b> Viral disease of cloven-hoofed animals<br><br>\
             <b>Symptoms:</b><br>🟢 Fever<br>🟢 Blisters<br><br>\
             <b>Treatment:</b><br>🟢 Wash lesions with neem water<br><br>\
             <b>Ingredients:</b><br>🟢 Neem<br>🟢 Turmeric"
        );
    }

    #[test]
    fn test_missing_fields_render_defaults() {
        let rendered = TemplateResponder::render_record(&ContentRecord::default());
        assert!(rendered.starts_with("<b>No Title</b>"));
        assert!(rendered.contains("<b>Definition:</b> No Definition"));
        assert!(rendered.contains("<b>Symptoms:</b><br><br><br>"));
    }

    #[test]
    fn test_records_joined_with_separator() {
        let records = vec![
            ContentRecord::new("Bloat", "Goat"),
            ContentRecord::new("Mastitis", "Cow"),
        ];
        let rendered = TemplateResponder::render(&records);
        let blocks: Vec<&str> = rendered.split("<br><br><b>Mastitis</b>").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("<b>Bloat</b>"));
    }

    #[test]
    fn test_escapes_markup_in_fields() {
        let record = ContentRecord::new("<script>", "Cow").with_symptoms("a & b");
        let rendered = TemplateResponder::render_record(&record);
        assert!(rendered.contains("&lt;script&gt;"));
        assert!(rendered.contains("🟢 a &amp; b"));
    }

    #[tokio::test]
    async fn test_compose_empty_is_no_results() {
        let answer = TemplateResponder::new().compose("anything", &[]).await;
        assert_eq!(answer, Answer::Text(NO_RESULTS_MESSAGE.to_string()));
    }
}
