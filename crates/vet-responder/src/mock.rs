//! Mock generator for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::GeneratorError;
use crate::Generator;

/// Generator with a canned reply that records every prompt it receives.
///
/// Useful for testing without making API calls.
pub struct MockGenerator {
    reply: Result<String, String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockGenerator {
    /// Always answer with `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Always fail with an API error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Number of `generate` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent prompt, if any.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new("Mock answer")
    }
}

#[async_trait]
impl Generator for MockGenerator {
    fn model(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        self.reply.clone().map_err(GeneratorError::ApiError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_calls() {
        let generator = MockGenerator::new("ok");
        assert_eq!(generator.generate("first").await.unwrap(), "ok");
        generator.generate("second").await.unwrap();

        assert_eq!(generator.call_count(), 2);
        assert_eq!(generator.last_prompt().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_failing() {
        let generator = MockGenerator::failing("HTTP 503");
        let err = generator.generate("p").await.unwrap_err();
        assert!(matches!(err, GeneratorError::ApiError(m) if m == "HTTP 503"));
    }
}
