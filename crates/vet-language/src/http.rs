//! LibreTranslate-compatible HTTP backend.
//!
//! Speaks the `/translate` and `/detect` endpoints:
//! - `POST /translate {q, source, target, format}` -> `{translatedText}`
//! - `POST /detect {q}` -> `[{language, confidence}]`

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use vet_types::LanguageSettings;

use crate::detect::LanguageDetector;
use crate::error::LanguageError;
use crate::tag::LanguageTag;
use crate::translate::{TextFormat, Translator};

/// Configuration for the HTTP translator.
#[derive(Debug, Clone)]
pub struct HttpTranslatorConfig {
    /// Service base URL (e.g. "https://libretranslate.example.org")
    pub base_url: String,

    /// API key, if the service requires one
    pub api_key: Option<SecretString>,

    /// Per-request timeout
    pub timeout: Duration,

    /// Maximum attempts per call
    pub max_retries: u32,
}

impl HttpTranslatorConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            max_retries: 2,
        }
    }

    /// Build from settings; `None` when no translator URL is configured.
    pub fn from_settings(settings: &LanguageSettings) -> Option<Self> {
        let url = settings.translator_url.as_deref()?.trim();
        if url.is_empty() {
            return None;
        }
        let mut config = Self::new(url);
        config.api_key = settings
            .translator_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);
        config.timeout = Duration::from_secs(settings.timeout_secs);
        Some(config)
    }
}

/// HTTP detect + translate client.
pub struct HttpTranslator {
    client: Client,
    config: HttpTranslatorConfig,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Serialize)]
struct DetectRequest<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct DetectCandidate {
    language: String,
    #[serde(default)]
    confidence: f32,
}

impl HttpTranslator {
    pub fn new(config: HttpTranslatorConfig) -> Result<Self, LanguageError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LanguageError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn api_key(&self) -> Option<&str> {
        self.config.api_key.as_ref().map(|k| k.expose_secret())
    }

    /// Run `op` with exponential backoff, retrying transient failures only.
    async fn with_retries<T, F, Fut>(&self, what: &str, op: F) -> Result<T, LanguageError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, LanguageError>>,
    {
        let mut backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(200),
            max_elapsed_time: Some(self.config.timeout * 2),
            ..Default::default()
        };
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(call = what, attempt = attempts, "Calling translation service");

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() || attempts >= self.config.max_retries.max(1) => {
                    error!(call = what, error = %e, attempts, "Translation service call failed");
                    return Err(e);
                }
                Err(e) => match backoff.next_backoff() {
                    Some(duration) => {
                        warn!(
                            call = what,
                            error = %e,
                            retry_in_ms = duration.as_millis(),
                            "Translation call failed, retrying"
                        );
                        tokio::time::sleep(duration).await;
                    }
                    None => return Err(e),
                },
            }
        }
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, LanguageError> {
        let url = format!("{}/{}", self.config.base_url, path);
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(LanguageError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LanguageError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| LanguageError::Parse(e.to_string()))
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    fn name(&self) -> &str {
        "http"
    }

    async fn translate(
        &self,
        text: &str,
        source: &LanguageTag,
        target: &LanguageTag,
        format: TextFormat,
    ) -> Result<String, LanguageError> {
        let request = TranslateRequest {
            q: text,
            source: source.as_str(),
            target: target.as_str(),
            format: format.as_str(),
            api_key: self.api_key(),
        };

        let request = &request;
        let response: TranslateResponse = self
            .with_retries("translate", move || self.post("translate", request))
            .await?;
        Ok(response.translated_text)
    }
}

#[async_trait]
impl LanguageDetector for HttpTranslator {
    fn name(&self) -> &str {
        "http"
    }

    async fn detect(&self, text: &str) -> Result<LanguageTag, LanguageError> {
        let request = DetectRequest {
            q: text,
            api_key: self.api_key(),
        };

        let request = &request;
        let candidates: Vec<DetectCandidate> = self
            .with_retries("detect", move || self.post("detect", request))
            .await?;

        candidates
            .into_iter()
            .filter(|c| !c.language.trim().is_empty())
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .map(|c| LanguageTag::new(&c.language))
            .ok_or(LanguageError::NoSignal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn translator(server: &MockServer) -> HttpTranslator {
        let mut config = HttpTranslatorConfig::new(server.uri());
        config.timeout = Duration::from_secs(2);
        HttpTranslator::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_translate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(body_partial_json(serde_json::json!({"source": "ta", "target": "en"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"translatedText": "cow has fever"})),
            )
            .mount(&server)
            .await;

        let out = translator(&server)
            .translate(
                "மாட்டுக்கு காய்ச்சல்",
                &"ta".into(),
                &"en".into(),
                TextFormat::Plain,
            )
            .await
            .unwrap();
        assert_eq!(out, "cow has fever");
    }

    #[tokio::test]
    async fn test_html_format_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(body_partial_json(serde_json::json!({"format": "html"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"translatedText": "<b>காய்ச்சல்</b>"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let out = translator(&server)
            .translate("<b>Fever</b>", &"en".into(), &"ta".into(), TextFormat::Html)
            .await
            .unwrap();
        assert_eq!(out, "<b>காய்ச்சல்</b>");
    }

    #[tokio::test]
    async fn test_detect_picks_highest_confidence() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"language": "en", "confidence": 12.0},
                {"language": "ta", "confidence": 91.0}
            ])))
            .mount(&server)
            .await;

        let tag = translator(&server).detect("மாடு").await.unwrap();
        assert_eq!(tag.as_str(), "ta");
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad language"))
            .expect(1)
            .mount(&server)
            .await;

        let err = translator(&server)
            .translate("x", &"xx".into(), &"en".into(), TextFormat::Plain)
            .await
            .unwrap_err();
        assert!(matches!(err, LanguageError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let result = translator(&server)
            .translate("x", &"ta".into(), &"en".into(), TextFormat::Plain)
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_config_from_settings() {
        let mut settings = LanguageSettings::default();
        assert!(HttpTranslatorConfig::from_settings(&settings).is_none());

        settings.translator_url = Some("http://localhost:5000/".to_string());
        settings.timeout_secs = 3;
        let config = HttpTranslatorConfig::from_settings(&settings).unwrap();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert!(config.api_key.is_none());
    }
}
