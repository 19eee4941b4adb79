//! Google Gemini provider implementation for ConversAI
//!
//! Talks to the `generateContent` REST endpoint. Every prompt is sent as a
//! single user turn; the text parts of the first candidate, joined, are the answer.

use crate::config::GeminiConfig;
use crate::error::{ConversaiError, Result};
use crate::providers::Provider;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini API provider
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if no API key is configured, or a
    /// `Generation` error if the HTTP client cannot be built
    ///
    /// # Examples
    ///
    /// ```
    /// use conversai::config::GeminiConfig;
    /// use conversai::providers::GeminiProvider;
    /// use std::time::Duration;
    ///
    /// let mut config = GeminiConfig::default();
    /// assert!(GeminiProvider::new(config.clone(), Duration::from_secs(30)).is_err());
    ///
    /// config.api_key = Some("test-key".to_string());
    /// assert!(GeminiProvider::new(config, Duration::from_secs(30)).is_ok());
    /// ```
    pub fn new(config: GeminiConfig, timeout: Duration) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ConversaiError::Config(
                    "Gemini API key missing: set GEMINI_API_KEY or provider.gemini.api_key"
                        .to_string(),
                )
            })?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("conversai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ConversaiError::Generation(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::info!("Initialized Gemini provider: model={}", config.model);

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        tracing::debug!(
            "Sending Gemini request: model={}, prompt_chars={}",
            self.config.model,
            prompt.chars().count()
        );

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                // the query string carries the API key
                let e = e.without_url();
                tracing::error!("Gemini request failed: {}", e);
                ConversaiError::Generation(format!("Gemini request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = describe_http_error(status, &body);
            tracing::error!("Gemini returned error {}: {}", status, message);
            return Err(ConversaiError::Generation(format!(
                "Gemini returned error {}: {}",
                status, message
            ))
            .into());
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            ConversaiError::Generation(format!("Failed to parse Gemini response: {}", e))
        })?;

        extract_text(parsed)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| {
            ConversaiError::Generation("Gemini returned no text in the response".to_string())
                .into()
        })
}

fn describe_http_error(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorWrapper>(body) {
        Ok(wrapper) => {
            let message = wrapper
                .error
                .message
                .unwrap_or_else(|| status.to_string());
            match wrapper.error.status {
                Some(code) if !code.is_empty() => format!("{}: {}", code, message),
                _ => message,
            }
        }
        Err(_) => body.to_string(),
    }
}
