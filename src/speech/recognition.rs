//! Speech-to-text
//!
//! Captured phrases are posted to an OpenAI-compatible transcription
//! endpoint. Failures surface as [`RecognitionFailure`] wrapped in
//! `ConversaiError::Recognition` so callers can substitute placeholder text.

use super::capture::{record_phrase, samples_to_wav, InputSource};
use crate::config::{CaptureConfig, RecognitionConfig};
use crate::error::{ConversaiError, RecognitionFailure, Result};
use crate::language::Language;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Response from the transcription API
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Speech recognition backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe WAV bytes spoken in `language`
    ///
    /// # Errors
    ///
    /// Returns `ConversaiError::Recognition` with `Unrecognized` for an
    /// empty transcript and `ServiceUnavailable` for transport or
    /// service errors
    async fn transcribe(&self, wav: Vec<u8>, language: Language) -> Result<String>;
}

/// Whisper-compatible transcription client
pub struct WhisperRecognizer {
    client: reqwest::Client,
    api_key: String,
    config: RecognitionConfig,
}

impl WhisperRecognizer {
    /// Create a new recognizer
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the API key is missing
    pub fn new(config: RecognitionConfig, timeout: Duration) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ConversaiError::Config(
                    "Speech recognition key missing: set OPENAI_API_KEY".to_string(),
                )
            })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("conversai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConversaiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }
}

fn unavailable(message: String) -> anyhow::Error {
    ConversaiError::Recognition(RecognitionFailure::ServiceUnavailable(message)).into()
}

#[async_trait]
impl SpeechRecognizer for WhisperRecognizer {
    async fn transcribe(&self, wav: Vec<u8>, language: Language) -> Result<String> {
        tracing::debug!(audio_bytes = wav.len(), language = language.code(), "starting transcription");

        let part = reqwest::multipart::Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| ConversaiError::Audio(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.config.model.clone())
            .text("language", language.code());

        let url = format!(
            "{}/v1/audio/transcriptions",
            self.config.api_base.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(unavailable(format!("HTTP {}: {}", status, body)));
        }

        let result: TranscriptionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            unavailable(e.to_string())
        })?;

        let text = result.text.trim().to_string();
        if text.is_empty() {
            return Err(ConversaiError::Recognition(RecognitionFailure::Unrecognized).into());
        }

        tracing::debug!(chars = text.chars().count(), "transcription complete");
        Ok(text)
    }
}

/// Listens for one phrase and recognizes it
pub struct SpeechCapture {
    recognizer: Arc<dyn SpeechRecognizer>,
    config: CaptureConfig,
}

impl SpeechCapture {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, config: CaptureConfig) -> Self {
        Self { recognizer, config }
    }

    /// Capture a phrase from `input` and transcribe it
    ///
    /// Reading the input runs on the blocking pool and is bounded by the
    /// listen timeout plus the phrase limit.
    ///
    /// # Errors
    ///
    /// Returns `ConversaiError::Recognition(Unrecognized)` if no speech was
    /// captured, recognition errors from the backend, or an `Audio` error if
    /// the input cannot be opened
    pub async fn listen(&self, input: InputSource, language: Language) -> Result<String> {
        let config = self.config;
        let captured = tokio::task::spawn_blocking(move || -> Result<Option<(Vec<f32>, u32)>> {
            let mut source = input.open(config)?;
            let rate = source.sample_rate();
            Ok(record_phrase(source.as_mut(), config)?.map(|samples| (samples, rate)))
        })
        .await
        .map_err(|e| ConversaiError::Audio(format!("capture task failed: {}", e)))??;

        let Some((samples, rate)) = captured else {
            return Err(ConversaiError::Recognition(RecognitionFailure::Unrecognized).into());
        };

        let wav = samples_to_wav(&samples, rate)?;
        self.recognizer.transcribe(wav, language).await
    }
}

/// Text to use as the question after a listen attempt
///
/// Recognition failures become their placeholder string; any other
/// error is passed through.
///
/// # Examples
///
/// ```
/// use conversai::error::{ConversaiError, RecognitionFailure};
/// use conversai::speech::recognized_or_placeholder;
///
/// let failed: conversai::error::Result<String> =
///     Err(ConversaiError::Recognition(RecognitionFailure::Unrecognized).into());
/// let (text, failure) = recognized_or_placeholder(failed).unwrap();
/// assert_eq!(text, "Could not understand audio");
/// assert!(failure.is_some());
/// ```
pub fn recognized_or_placeholder(
    result: Result<String>,
) -> Result<(String, Option<RecognitionFailure>)> {
    match result {
        Ok(text) => Ok((text, None)),
        Err(err) => match err.downcast::<ConversaiError>() {
            Ok(ConversaiError::Recognition(failure)) => {
                tracing::warn!("speech recognition failed: {}", failure);
                Ok((failure.placeholder().to_string(), Some(failure)))
            }
            Ok(other) => Err(other.into()),
            Err(err) => Err(err),
        },
    }
}
