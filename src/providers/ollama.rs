//! Ollama provider implementation for ConversAI
//!
//! This module implements the Provider trait for Ollama, connecting to a local
//! or remote Ollama server. Each prompt is sent as a lone user message with
//! streaming disabled.

use crate::config::OllamaConfig;
use crate::error::{ConversaiError, Result};
use crate::providers::{Message, Provider};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API provider
///
/// # Examples
///
/// ```no_run
/// use conversai::config::OllamaConfig;
/// use conversai::providers::{OllamaProvider, Provider};
/// use std::time::Duration;
///
/// # async fn example() -> conversai::error::Result<()> {
/// let config = OllamaConfig {
///     host: "http://localhost:11434".to_string(),
///     model: "llama3.2:latest".to_string(),
/// };
/// let provider = OllamaProvider::new(config, Duration::from_secs(60))?;
/// let answer = provider.generate("Hello!").await?;
/// # Ok(())
/// # }
/// ```
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

/// Request structure for Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

/// Response structure from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: Message,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

impl OllamaProvider {
    /// Create a new Ollama provider instance
    ///
    /// # Arguments
    ///
    /// * `config` - Ollama configuration containing host and model
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use conversai::config::OllamaConfig;
    /// use conversai::providers::OllamaProvider;
    /// use std::time::Duration;
    ///
    /// let provider = OllamaProvider::new(OllamaConfig::default(), Duration::from_secs(30));
    /// assert!(provider.is_ok());
    /// ```
    pub fn new(config: OllamaConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("conversai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ConversaiError::Generation(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::info!(
            "Initialized Ollama provider: host={}, model={}",
            config.host,
            config.model
        );

        Ok(Self { client, config })
    }

    /// Get the configured Ollama host
    pub fn host(&self) -> &str {
        &self.config.host
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.config.host.trim_end_matches('/'));
        let request = OllamaRequest {
            model: self.config.model.clone(),
            messages: vec![Message::user(prompt)],
            stream: false,
        };

        tracing::debug!(
            "Sending Ollama request: model={}, prompt_chars={}",
            request.model,
            prompt.chars().count()
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Ollama request failed: {}", e);
                ConversaiError::Generation(format!("Ollama request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, error_text);
            return Err(ConversaiError::Generation(format!(
                "Ollama returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Ollama response: {}", e);
            ConversaiError::Generation(format!("Failed to parse Ollama response: {}", e))
        })?;

        tracing::debug!(
            "Ollama response: done={}, prompt_tokens={}, completion_tokens={}",
            ollama_response.done,
            ollama_response.prompt_eval_count,
            ollama_response.eval_count
        );

        let text = ollama_response.message.content;
        if text.trim().is_empty() {
            return Err(
                ConversaiError::Generation("Ollama returned an empty response".to_string()).into(),
            );
        }

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }
}
