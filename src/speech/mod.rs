//! Speech input and output
//!
//! Handles phrase capture and recognition, synthesis, and playback.

pub mod capture;
pub mod playback;
pub mod recognition;
pub mod synthesis;

pub use capture::{
    capture_budget, record_phrase, samples_to_wav, AudioSource, EndpointDecision, Endpointer,
    InputSource, StreamBuffer, WavFileSource, SAMPLE_RATE,
};
pub use playback::{create_player, AudioPlayer, CommandPlayer};
pub use recognition::{recognized_or_placeholder, SpeechCapture, SpeechRecognizer, WhisperRecognizer};
pub use synthesis::{GoogleTts, Speaker, SpeechOutput, SpeechSynthesizer};

#[cfg(feature = "audio")]
pub use capture::MicrophoneSource;
#[cfg(feature = "audio")]
pub use playback::SpeakerPlayer;
