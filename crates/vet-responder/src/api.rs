//! Hosted language-model backends.
//!
//! Two wire formats are supported: OpenAI-compatible chat completions (used by
//! Mistral and OpenAI) and Gemini `generateContent`.

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};
use vet_types::ResponderSettings;

use crate::error::GeneratorError;
use crate::Generator;

/// Request format spoken by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFlavor {
    /// `POST {base}/chat/completions` with a bearer token
    ChatCompletions,
    /// `POST {base}/models/{model}:generateContent` with `x-goog-api-key`
    Gemini,
}

/// Configuration for API-based generation.
#[derive(Debug, Clone)]
pub struct ApiGeneratorConfig {
    pub flavor: ApiFlavor,

    /// API base URL (e.g., "https://api.mistral.ai/v1")
    pub base_url: String,

    /// Model to use (e.g., "open-mistral-7b")
    pub model: String,

    /// API key
    pub api_key: SecretString,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout
    pub timeout: Duration,

    /// Maximum attempts per call
    pub max_retries: u32,
}

impl ApiGeneratorConfig {
    fn with_defaults(
        flavor: ApiFlavor,
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            flavor,
            base_url: base_url.to_string(),
            model: model.into(),
            api_key: SecretString::from(api_key.into()),
            temperature: 0.7,
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }

    /// Create config for the Mistral API.
    pub fn mistral(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_defaults(
            ApiFlavor::ChatCompletions,
            "https://api.mistral.ai/v1",
            api_key,
            model,
        )
    }

    /// Create config for the OpenAI API.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_defaults(
            ApiFlavor::ChatCompletions,
            "https://api.openai.com/v1",
            api_key,
            model,
        )
    }

    /// Create config for the Gemini API.
    pub fn gemini(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_defaults(
            ApiFlavor::Gemini,
            "https://generativelanguage.googleapis.com/v1beta",
            api_key,
            model,
        )
    }

    /// Build from responder settings, resolving the key from the environment.
    pub fn from_settings(settings: &ResponderSettings) -> Result<Self, GeneratorError> {
        let key = settings
            .resolved_api_key()
            .ok_or_else(|| GeneratorError::MissingCredential(settings.provider_key_var().to_string()))?;

        let mut config = match settings.provider.as_str() {
            "mistral" => Self::mistral(key, settings.model.clone()),
            "openai" => Self::openai(key, settings.model.clone()),
            "gemini" => Self::gemini(key, settings.model.clone()),
            other => {
                return Err(GeneratorError::ConfigError(format!(
                    "unknown provider: {}",
                    other
                )))
            }
        };
        if let Some(url) = &settings.api_base_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        config.temperature = settings.temperature;
        config.timeout = Duration::from_secs(settings.timeout_secs);
        config.max_retries = settings.max_retries;
        Ok(config)
    }
}

/// API-based generator implementation.
pub struct ApiGenerator {
    client: Client,
    config: ApiGeneratorConfig,
}

impl ApiGenerator {
    pub fn new(config: ApiGeneratorConfig) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GeneratorError::ConfigError(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiGeneratorConfig {
        &self.config
    }

    /// Call the API with retry logic.
    async fn call_api(&self, prompt: &str) -> Result<String, GeneratorError> {
        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.config.timeout * 2),
            ..Default::default()
        };

        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, model = %self.config.model, "Calling generation API");

            match self.make_request(prompt).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if !e.is_transient() || attempts >= self.config.max_retries.max(1) {
                        error!(error = %e, attempts, "Generation failed");
                        return Err(e);
                    }

                    match backoff.next_backoff() {
                        Some(duration) => {
                            warn!(
                                error = %e,
                                retry_in_ms = duration.as_millis(),
                                "API call failed, retrying"
                            );
                            tokio::time::sleep(duration).await;
                        }
                        None => {
                            error!(error = %e, "Backoff exhausted");
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    async fn make_request(&self, prompt: &str) -> Result<String, GeneratorError> {
        match self.config.flavor {
            ApiFlavor::ChatCompletions => self.make_chat_request(prompt).await,
            ApiFlavor::Gemini => self.make_gemini_request(prompt).await,
        }
    }

    /// Make OpenAI-compatible API request.
    async fn make_chat_request(&self, prompt: &str) -> Result<String, GeneratorError> {
        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage<'a>>,
            temperature: f32,
        }

        #[derive(Serialize)]
        struct ChatMessage<'a> {
            role: &'static str,
            content: &'a str,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<ChatChoice>,
        }

        #[derive(Deserialize)]
        struct ChatChoice {
            message: ChatMessageResponse,
        }

        #[derive(Deserialize)]
        struct ChatMessageResponse {
            #[serde(default)]
            content: Option<String>,
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
        };

        let url = format!("{}/chat/completions", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(request_error)?;

        let body: ChatResponse = read_json(response).await?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GeneratorError::ParseError("No choices in response".to_string()))
    }

    /// Make Gemini API request.
    async fn make_gemini_request(&self, prompt: &str) -> Result<String, GeneratorError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct GeminiRequest<'a> {
            contents: Vec<GeminiContent<'a>>,
            generation_config: GenerationConfig,
        }

        #[derive(Serialize)]
        struct GeminiContent<'a> {
            parts: Vec<GeminiPart<'a>>,
        }

        #[derive(Serialize)]
        struct GeminiPart<'a> {
            text: &'a str,
        }

        #[derive(Serialize)]
        struct GenerationConfig {
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct GeminiResponse {
            #[serde(default)]
            candidates: Vec<GeminiCandidate>,
        }

        #[derive(Deserialize)]
        struct GeminiCandidate {
            content: GeminiCandidateContent,
        }

        #[derive(Deserialize)]
        struct GeminiCandidateContent {
            #[serde(default)]
            parts: Vec<GeminiCandidatePart>,
        }

        #[derive(Deserialize)]
        struct GeminiCandidatePart {
            #[serde(default)]
            text: String,
        }

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(request_error)?;

        let body: GeminiResponse = read_json(response).await?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| GeneratorError::ParseError("No candidates in response".to_string()))?
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();
        Ok(text)
    }
}

fn request_error(e: reqwest::Error) -> GeneratorError {
    if e.is_timeout() {
        GeneratorError::Timeout
    } else {
        GeneratorError::ApiError(e.to_string())
    }
}

/// Map status codes to errors and decode a successful body.
async fn read_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, GeneratorError> {
    let status = response.status();
    if status.as_u16() == 429 {
        return Err(GeneratorError::RateLimitExceeded);
    }

    if status.is_client_error() {
        let body = response.text().await.unwrap_or_default();
        return Err(GeneratorError::ConfigError(format!(
            "HTTP {}: {}",
            status, body
        )));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GeneratorError::ApiError(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| GeneratorError::ParseError(e.to_string()))
}

#[async_trait]
impl Generator for ApiGenerator {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let text = self.call_api(prompt).await?;
        if text.trim().is_empty() {
            return Err(GeneratorError::EmptyOutput);
        }
        Ok(text)
    }
}
