//! Text-to-speech
//!
//! Answers are synthesized through the Google Translate TTS endpoint,
//! written to a scoped temporary `.mp3` file, played, and deleted.

use super::playback::AudioPlayer;
use crate::config::SynthesisConfig;
use crate::error::{ConversaiError, Result};
use crate::language::Language;
use crate::text::split_into_chunks;

use async_trait::async_trait;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// Produces MP3 audio for text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` spoken in `language`
    ///
    /// # Errors
    ///
    /// Returns a `Synthesis` error if the request fails or yields no audio
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>>;
}

/// Speaks text aloud end to end
///
/// This is the seam the turn orchestrator depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Synthesize and play `text`, returning once playback has finished
    ///
    /// # Errors
    ///
    /// Returns `Synthesis` or `Playback` errors
    async fn speak(&self, text: &str, language: Language) -> Result<()>;
}

/// Google Translate TTS client
pub struct GoogleTts {
    client: reqwest::Client,
    config: SynthesisConfig,
}

impl GoogleTts {
    /// Create a new TTS client
    ///
    /// # Errors
    ///
    /// Returns a `Synthesis` error if the HTTP client cannot be built
    pub fn new(config: SynthesisConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("conversai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConversaiError::Synthesis(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        language: Language,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>> {
        let url = format!("{}/translate_tts", self.config.api_base.trim_end_matches('/'));
        let total = total.to_string();
        let idx = idx.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language.code()),
                ("q", chunk),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "TTS request failed");
                ConversaiError::Synthesis(format!("TTS request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, "TTS API error");
            return Err(ConversaiError::Synthesis(format!("TTS returned HTTP {}", status)).into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ConversaiError::Synthesis(format!("Failed to read TTS audio: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>> {
        let chunks = split_into_chunks(text, self.config.max_chunk_chars);
        if chunks.is_empty() {
            return Err(ConversaiError::Synthesis("Nothing to synthesize".to_string()).into());
        }

        tracing::debug!(
            chunks = chunks.len(),
            language = language.code(),
            "synthesizing speech"
        );

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            audio.extend(self.fetch_chunk(chunk, language, idx, chunks.len()).await?);
        }

        if audio.is_empty() {
            return Err(ConversaiError::Synthesis("TTS returned no audio".to_string()).into());
        }
        Ok(audio)
    }
}

/// Synthesizes to a temporary file and hands it to a player
pub struct Speaker {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    player: Arc<dyn AudioPlayer>,
}

impl Speaker {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, player: Arc<dyn AudioPlayer>) -> Self {
        Self {
            synthesizer,
            player,
        }
    }
}

#[async_trait]
impl SpeechOutput for Speaker {
    async fn speak(&self, text: &str, language: Language) -> Result<()> {
        let audio = self.synthesizer.synthesize(text, language).await?;

        // Removed when dropped, so every return below deletes the file
        let mut file = tempfile::Builder::new()
            .prefix("conversai-")
            .suffix(".mp3")
            .tempfile()
            .map_err(|e| ConversaiError::Synthesis(format!("Failed to create audio file: {}", e)))?;
        file.write_all(&audio)
            .and_then(|_| file.flush())
            .map_err(|e| ConversaiError::Synthesis(format!("Failed to write audio file: {}", e)))?;

        tracing::debug!(path = %file.path().display(), bytes = audio.len(), "playing synthesized audio");
        let played = self.player.play(file.path()).await;

        if let Err(e) = file.close() {
            tracing::warn!("Failed to remove temporary audio file: {}", e);
        }
        played
    }
}
