//! Machine translation
//!
//! Uses the public Google Translate endpoint. Text is sent unchanged when it
//! fits in one request; longer text is split on line and word boundaries and
//! the original separators are put back between the translated pieces.

use crate::config::TranslationConfig;
use crate::error::{ConversaiError, Result};
use crate::language::Language;
use crate::text::split_preserving_separators;

use async_trait::async_trait;
use std::time::Duration;

/// Translation backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source` to `target`
    ///
    /// # Errors
    ///
    /// Returns a `Translation` error on transport, service, or parse failure
    async fn translate(&self, text: &str, source: Language, target: Language) -> Result<String>;
}

/// Google Translate client
pub struct GoogleTranslator {
    client: reqwest::Client,
    config: TranslationConfig,
}

impl GoogleTranslator {
    /// Create a new translator
    ///
    /// # Errors
    ///
    /// Returns a `Translation` error if the HTTP client cannot be built
    pub fn new(config: TranslationConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("conversai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ConversaiError::Translation(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { client, config })
    }

    async fn translate_chunk(&self, chunk: &str, source: Language, target: Language) -> Result<String> {
        let url = format!("{}/translate_a/single", self.config.api_base.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("dt", "t"),
                ("sl", source.code()),
                ("tl", target.code()),
                ("q", chunk),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Translation request failed: {}", e);
                ConversaiError::Translation(format!("Translation request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Translation service returned {}: {}", status, body);
            return Err(ConversaiError::Translation(format!(
                "Translation service returned {}",
                status
            ))
            .into());
        }

        let value: serde_json::Value = response.json().await.map_err(|e| {
            ConversaiError::Translation(format!("Failed to parse translation response: {}", e))
        })?;
        parse_segments(&value)
    }
}

/// Concatenate the translated segments of a `translate_a/single` response
///
/// The payload is a nested array whose first element lists segments, each
/// segment an array whose first element is the translated text.
fn parse_segments(value: &serde_json::Value) -> Result<String> {
    let segments = value
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            ConversaiError::Translation("Unexpected translation response shape".to_string())
        })?;

    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        return Err(
            ConversaiError::Translation("Translation response held no text".to_string()).into(),
        );
    }
    Ok(text)
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, source: Language, target: Language) -> Result<String> {
        if source == target || text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let chunks = split_preserving_separators(text, self.config.max_chunk_chars);
        tracing::debug!(
            from = source.code(),
            to = target.code(),
            chunks = chunks.len(),
            "translating"
        );

        if let [whole] = chunks.as_slice() {
            return self.translate_chunk(whole, source, target).await;
        }

        let mut translated = String::with_capacity(text.len());
        for chunk in chunks {
            let body = chunk.trim();
            if body.is_empty() {
                translated.push_str(chunk);
                continue;
            }
            let leading = &chunk[..chunk.len() - chunk.trim_start().len()];
            let trailing = &chunk[chunk.trim_end().len()..];
            translated.push_str(leading);
            translated.push_str(&self.translate_chunk(body, source, target).await?);
            translated.push_str(trailing);
        }
        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_segments_concatenates() {
        let value = json!([[["Hello, ", "नमस्ते, ", null], ["world", "दुनिया", null]], null, "hi"]);
        assert_eq!(parse_segments(&value).unwrap(), "Hello, world");
    }

    #[test]
    fn test_parse_segments_bad_shape() {
        assert!(parse_segments(&json!({"error": "nope"})).is_err());
        assert!(parse_segments(&json!([[]])).is_err());
    }

    #[tokio::test]
    async fn test_same_language_is_identity() {
        let config = TranslationConfig {
            api_base: "http://127.0.0.1:1".to_string(),
            ..TranslationConfig::default()
        };
        let translator = GoogleTranslator::new(config, Duration::from_secs(1)).unwrap();
        let text = translator
            .translate("unchanged text", Language::Hindi, Language::Hindi)
            .await
            .unwrap();
        assert_eq!(text, "unchanged text");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_translation_error() {
        let config = TranslationConfig {
            api_base: "http://127.0.0.1:1".to_string(),
            ..TranslationConfig::default()
        };
        let translator = GoogleTranslator::new(config, Duration::from_secs(1)).unwrap();
        let err = translator
            .translate("hello", Language::English, Language::Hindi)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConversaiError>(),
            Some(ConversaiError::Translation(_))
        ));
    }
}
