//! Provider module for ConversAI
//!
//! This module contains the generation backend abstraction and
//! implementations for Google Gemini and Ollama.

pub mod base;
pub mod gemini;
pub mod ollama;

pub use base::{Message, Provider};
pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;

#[cfg(test)]
pub use base::MockProvider;

use crate::config::ProviderConfig;
use crate::error::{ConversaiError, Result};
use std::time::Duration;

/// Create a provider instance based on configuration
///
/// # Arguments
///
/// * `provider_type` - Type of provider ("gemini" or "ollama")
/// * `config` - Provider configuration
/// * `timeout` - Per-request timeout for the backend's HTTP client
///
/// # Errors
///
/// Returns error if provider type is invalid or initialization fails
pub fn create_provider(
    provider_type: &str,
    config: &ProviderConfig,
    timeout: Duration,
) -> Result<Box<dyn Provider>> {
    create_provider_with_override(config, Some(provider_type), None, timeout)
}

/// Create a provider instance with optional provider and model overrides
///
/// Used when the command line names a different backend or model than
/// the configuration file.
///
/// # Arguments
///
/// * `config` - Full provider configuration containing all provider settings
/// * `provider_override` - Optional provider type override ("gemini" or "ollama")
/// * `model_override` - Optional model name override
/// * `timeout` - Per-request timeout for the backend's HTTP client
///
/// # Errors
///
/// Returns error if:
/// - Provider type is invalid
/// - The Gemini API key is missing
/// - The HTTP client cannot be built
///
/// # Examples
///
/// ```no_run
/// use conversai::providers::create_provider_with_override;
/// use conversai::config::ProviderConfig;
/// use std::time::Duration;
///
/// # fn example() -> conversai::error::Result<()> {
/// let config = ProviderConfig::default();
///
/// // Override to use Ollama with a smaller model
/// let provider = create_provider_with_override(
///     &config,
///     Some("ollama"),
///     Some("gemma2:2b"),
///     Duration::from_secs(60),
/// )?;
/// # Ok(())
/// # }
/// ```
pub fn create_provider_with_override(
    config: &ProviderConfig,
    provider_override: Option<&str>,
    model_override: Option<&str>,
    timeout: Duration,
) -> Result<Box<dyn Provider>> {
    let provider_type = provider_override.unwrap_or(&config.provider_type);

    match provider_type {
        "gemini" => {
            let mut gemini_config = config.gemini.clone();
            if let Some(model) = model_override {
                gemini_config.model = model.to_string();
            }

            Ok(Box::new(GeminiProvider::new(gemini_config, timeout)?))
        }
        "ollama" => {
            let mut ollama_config = config.ollama.clone();
            if let Some(model) = model_override {
                ollama_config.model = model.to_string();
            }

            Ok(Box::new(OllamaProvider::new(ollama_config, timeout)?))
        }
        _ => Err(ConversaiError::Config(format!(
            "Unknown provider type: {}",
            provider_type
        ))
        .into()),
    }
}
