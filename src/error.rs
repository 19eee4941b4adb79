//! Error types for ConversAI
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Reasons a speech recognition attempt can fail
///
/// Both kinds are non-fatal: the chat loop shows a placeholder
/// string instead of aborting the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionFailure {
    /// The audio could not be mapped to text (silence, noise, empty transcript)
    #[error("speech was not understood")]
    Unrecognized,

    /// The recognition service could not be reached or returned an error
    #[error("speech recognition service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl RecognitionFailure {
    /// Placeholder question text shown in place of a transcript
    ///
    /// # Examples
    ///
    /// ```
    /// use conversai::error::RecognitionFailure;
    ///
    /// assert_eq!(
    ///     RecognitionFailure::Unrecognized.placeholder(),
    ///     "Could not understand audio"
    /// );
    /// ```
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Unrecognized => "Could not understand audio",
            Self::ServiceUnavailable(_) => "Speech recognition service error",
        }
    }
}

/// Main error type for ConversAI operations
///
/// This enum covers configuration loading, the credential store,
/// and every external collaborator the turn pipeline talks to.
#[derive(Error, Debug)]
pub enum ConversaiError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Duplicate registration or bad credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Speech capture or recognition failed
    #[error("Recognition error: {0}")]
    Recognition(#[from] RecognitionFailure),

    /// Text-to-speech synthesis failed
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Synthesized audio could not be played
    #[error("Playback error: {0}")]
    Playback(String),

    /// Machine translation failed
    #[error("Translation error: {0}")]
    Translation(String),

    /// The generative model call failed
    #[error("Generation error: {0}")]
    Generation(String),

    /// Audio device or encoding errors
    #[error("Audio error: {0}")]
    Audio(String),

    /// Credential file errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for ConversAI operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
