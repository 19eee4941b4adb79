//! Audio playback
//!
//! Synthesized answers are played either by an external command
//! (`ffplay` by default) or, with the `audio` feature, decoded in-process
//! and sent to the default output device.

use crate::config::SynthesisConfig;
use crate::error::{ConversaiError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Plays an audio file to completion
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Play the MP3 file at `path`, returning once playback has finished
    ///
    /// # Errors
    ///
    /// Returns a `Playback` error if the file cannot be played
    async fn play(&self, path: &Path) -> Result<()>;
}

/// Runs an external program with the file path appended
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    /// Build from a command line such as `["ffplay", "-nodisp", "-autoexit"]`
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if `command` is empty
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command.split_first().ok_or_else(|| {
            ConversaiError::Config("speech.synthesis.player_command is empty".to_string())
        })?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl AudioPlayer for CommandPlayer {
    async fn play(&self, path: &Path) -> Result<()> {
        tracing::debug!(player = %self.program, "starting playback");

        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, player = %self.program, "failed to start player");
                ConversaiError::Playback(format!("Failed to run {}: {}", self.program, e))
            })?;

        if !status.success() {
            return Err(ConversaiError::Playback(format!(
                "{} exited with {}",
                self.program, status
            ))
            .into());
        }

        Ok(())
    }
}

/// Plays to the default output device
#[cfg(feature = "audio")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SpeakerPlayer;

#[cfg(feature = "audio")]
#[async_trait]
impl AudioPlayer for SpeakerPlayer {
    async fn play(&self, path: &Path) -> Result<()> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ConversaiError::Playback(format!("Failed to read audio: {}", e)))?;
        tokio::task::spawn_blocking(move || speaker::play_mp3(&data))
            .await
            .map_err(|e| ConversaiError::Playback(format!("playback task failed: {}", e)))?
    }
}

#[cfg(feature = "audio")]
mod speaker {
    use crate::error::{ConversaiError, Result};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    struct Decoded {
        samples: Vec<f32>,
        sample_rate: u32,
    }

    fn decode_mp3(mp3_data: &[u8]) -> Result<Decoded> {
        let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
        let mut samples = Vec::new();
        let mut sample_rate = 24000;

        loop {
            match decoder.next_frame() {
                Ok(frame) => {
                    sample_rate = frame.sample_rate as u32;
                    if frame.channels == 2 {
                        samples.extend(frame.data.chunks(2).map(|pair| {
                            let left = f32::from(pair[0]) / 32768.0;
                            let right = f32::from(pair.get(1).copied().unwrap_or(pair[0])) / 32768.0;
                            (left + right) / 2.0
                        }));
                    } else {
                        samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                    }
                }
                Err(minimp3::Error::Eof) => break,
                Err(e) => return Err(ConversaiError::Playback(format!("MP3 decode error: {e}")).into()),
            }
        }

        Ok(Decoded {
            samples,
            sample_rate,
        })
    }

    pub(super) fn play_mp3(data: &[u8]) -> Result<()> {
        let decoded = decode_mp3(data)?;
        if decoded.samples.is_empty() {
            return Ok(());
        }

        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| ConversaiError::Playback("no output device available".to_string()))?;
        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(decoded.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let total = decoded.samples.len();
        let samples = Arc::new(decoded.samples);
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stream = {
            let samples = Arc::clone(&samples);
            let position = Arc::clone(&position);
            let finished = Arc::clone(&finished);
            device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        for out in data.iter_mut() {
                            let pos = position.fetch_add(1, Ordering::Relaxed);
                            *out = samples.get(pos).copied().unwrap_or_else(|| {
                                finished.store(true, Ordering::Relaxed);
                                0.0
                            });
                        }
                    },
                    |err| tracing::error!(error = %err, "audio playback error"),
                    None,
                )
                .map_err(|e| ConversaiError::Playback(e.to_string()))?
        };
        stream
            .play()
            .map_err(|e| ConversaiError::Playback(e.to_string()))?;

        let duration_ms = (total as u64 * 1000) / u64::from(decoded.sample_rate.max(1));
        let deadline = Instant::now() + Duration::from_millis(duration_ms + 500);
        while !finished.load(Ordering::Relaxed) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(50));
        }

        drop(stream);
        tracing::debug!(samples = total, "playback complete");
        Ok(())
    }
}

/// Select the player described by the synthesis config
///
/// # Errors
///
/// Returns a `Config` error if no player command is set and in-process
/// playback is not compiled in
pub fn create_player(config: &SynthesisConfig) -> Result<Arc<dyn AudioPlayer>> {
    if !config.player_command.is_empty() {
        return Ok(Arc::new(CommandPlayer::new(&config.player_command)?));
    }

    #[cfg(feature = "audio")]
    {
        Ok(Arc::new(SpeakerPlayer))
    }

    #[cfg(not(feature = "audio"))]
    {
        Err(ConversaiError::Config(
            "speech.synthesis.player_command is empty and the `audio` feature is disabled"
                .to_string(),
        )
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_player_requires_program() {
        assert!(CommandPlayer::new(&[]).is_err());
    }

    #[test]
    fn test_create_player_from_default_config() {
        assert!(create_player(&SynthesisConfig::default()).is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_player_success() {
        let player = CommandPlayer::new(&["true".to_string()]).unwrap();
        assert!(player.play(Path::new("/tmp/whatever.mp3")).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_player_nonzero_exit() {
        let player = CommandPlayer::new(&["false".to_string()]).unwrap();
        let err = player.play(Path::new("/tmp/whatever.mp3")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConversaiError>(),
            Some(ConversaiError::Playback(_))
        ));
    }

    #[tokio::test]
    async fn test_command_player_missing_program() {
        let player = CommandPlayer::new(&["conversai-no-such-player".to_string()]).unwrap();
        assert!(player.play(Path::new("x.mp3")).await.is_err());
    }
}
