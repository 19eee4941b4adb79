//! Configuration management for ConversAI
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ConversaiError, Result};
use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for ConversAI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Generative model provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Machine translation settings
    #[serde(default)]
    pub translation: TranslationConfig,
    /// Speech recognition, synthesis, and playback settings
    #[serde(default)]
    pub speech: SpeechConfig,
    /// Session defaults (languages, toggles, login gate)
    #[serde(default)]
    pub session: SessionConfig,
    /// Credential store settings
    #[serde(default)]
    pub auth: AuthConfig,
    /// Timeout applied to every external HTTP call (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            translation: TranslationConfig::default(),
            speech: SpeechConfig::default(),
            session: SessionConfig::default(),
            auth: AuthConfig::default(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Provider configuration
///
/// Specifies which generation backend to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use ("gemini" or "ollama")
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// Gemini configuration
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

fn default_provider_type() -> String {
    "gemini".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            gemini: GeminiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// Google Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Model to use for Gemini
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API base URL (overridable for tests and proxies)
    #[serde(default = "default_gemini_api_base")]
    pub api_base: String,

    /// API key, normally supplied through `GEMINI_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
            api_base: default_gemini_api_base(),
            api_key: None,
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use for Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:latest".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
        }
    }
}

/// Machine translation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Translation endpoint base URL
    #[serde(default = "default_translation_api_base")]
    pub api_base: String,

    /// Longest text sent in one request (characters)
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
}

fn default_translation_api_base() -> String {
    "https://translate.googleapis.com".to_string()
}

fn default_max_chunk_chars() -> usize {
    5000
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_base: default_translation_api_base(),
            max_chunk_chars: default_max_chunk_chars(),
        }
    }
}

/// Speech settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Speech-to-text service
    #[serde(default)]
    pub recognition: RecognitionConfig,

    /// Text-to-speech service
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Microphone endpointing
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Submit the placeholder text as a question when recognition fails
    #[serde(default = "default_submit_on_failure")]
    pub submit_on_recognition_failure: bool,
}

fn default_submit_on_failure() -> bool {
    true
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            recognition: RecognitionConfig::default(),
            synthesis: SynthesisConfig::default(),
            capture: CaptureConfig::default(),
            submit_on_recognition_failure: default_submit_on_failure(),
        }
    }
}

/// Speech-to-text configuration (OpenAI-compatible transcription API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    #[serde(default = "default_recognition_api_base")]
    pub api_base: String,

    #[serde(default = "default_recognition_model")]
    pub model: String,

    /// API key, normally supplied through `OPENAI_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_recognition_api_base() -> String {
    "https://api.openai.com".to_string()
}

fn default_recognition_model() -> String {
    "whisper-1".to_string()
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            api_base: default_recognition_api_base(),
            model: default_recognition_model(),
            api_key: None,
        }
    }
}

/// Text-to-speech configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Google Translate TTS base URL
    #[serde(default = "default_synthesis_api_base")]
    pub api_base: String,

    /// Longest text sent per TTS request (characters)
    #[serde(default = "default_synthesis_chunk_chars")]
    pub max_chunk_chars: usize,

    /// External player invoked with the audio file path appended.
    /// Empty means in-process playback (requires the `audio` feature).
    #[serde(default = "default_player_command")]
    pub player_command: Vec<String>,
}

fn default_synthesis_api_base() -> String {
    "https://translate.google.com".to_string()
}

fn default_synthesis_chunk_chars() -> usize {
    100
}

fn default_player_command() -> Vec<String> {
    ["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            api_base: default_synthesis_api_base(),
            max_chunk_chars: default_synthesis_chunk_chars(),
            player_command: default_player_command(),
        }
    }
}

/// Microphone endpointing configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// RMS level above which a frame counts as speech
    #[serde(default = "default_energy_threshold")]
    pub energy_threshold: f32,

    /// Silence after speech that ends the phrase (milliseconds)
    #[serde(default = "default_pause_threshold_ms")]
    pub pause_threshold_ms: u64,

    /// Give up if no speech starts within this many seconds
    #[serde(default = "default_listen_timeout")]
    pub listen_timeout_seconds: u64,

    /// Hard cap on phrase length (seconds)
    #[serde(default = "default_phrase_limit")]
    pub phrase_limit_seconds: u64,
}

fn default_energy_threshold() -> f32 {
    0.02
}

fn default_pause_threshold_ms() -> u64 {
    800
}

fn default_listen_timeout() -> u64 {
    10
}

fn default_phrase_limit() -> u64 {
    30
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            energy_threshold: default_energy_threshold(),
            pause_threshold_ms: default_pause_threshold_ms(),
            listen_timeout_seconds: default_listen_timeout(),
            phrase_limit_seconds: default_phrase_limit(),
        }
    }
}

/// Session defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_language")]
    pub question_language: Language,

    #[serde(default = "default_language")]
    pub answer_language: Language,

    /// Speak answers by default
    #[serde(default)]
    pub voice: bool,

    /// Summarize answers by default
    #[serde(default)]
    pub summarize: bool,

    /// Refuse turns until a user has logged in
    #[serde(default)]
    pub require_login: bool,
}

fn default_language() -> Language {
    Language::English
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            question_language: default_language(),
            answer_language: default_language(),
            voice: false,
            summarize: false,
            require_login: false,
        }
    }
}

/// Credential store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Path of the users file; defaults to the platform data directory
    #[serde(default)]
    pub users_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars()?;
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConversaiError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ConversaiError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) -> Result<()> {
        // Credentials are only ever taken from the environment or the file
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.provider.gemini.api_key = Some(key);
        }

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.speech.recognition.api_key = Some(key);
        }

        if let Ok(provider_type) = std::env::var("CONVERSAI_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(model) = std::env::var("CONVERSAI_GEMINI_MODEL") {
            self.provider.gemini.model = model;
        }

        if let Ok(host) = std::env::var("CONVERSAI_OLLAMA_HOST") {
            self.provider.ollama.host = host;
        }

        if let Ok(model) = std::env::var("CONVERSAI_OLLAMA_MODEL") {
            self.provider.ollama.model = model;
        }

        if let Ok(lang) = std::env::var("CONVERSAI_QUESTION_LANGUAGE") {
            self.session.question_language = Language::parse_str(&lang).map_err(|e| {
                ConversaiError::Config(format!("Invalid CONVERSAI_QUESTION_LANGUAGE: {}", e))
            })?;
        }

        if let Ok(lang) = std::env::var("CONVERSAI_ANSWER_LANGUAGE") {
            self.session.answer_language = Language::parse_str(&lang).map_err(|e| {
                ConversaiError::Config(format!("Invalid CONVERSAI_ANSWER_LANGUAGE: {}", e))
            })?;
        }

        if let Ok(path) = std::env::var("CONVERSAI_USERS_FILE") {
            self.auth.users_file = Some(PathBuf::from(path));
        }

        if let Ok(timeout) = std::env::var("CONVERSAI_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.request_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid CONVERSAI_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        Ok(())
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(path) = &cli.users_file {
            self.auth.users_file = Some(path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns a `Config` error naming the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider_type.is_empty() {
            return Err(ConversaiError::Config("Provider type cannot be empty".to_string()).into());
        }

        let valid_providers = ["gemini", "ollama"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(ConversaiError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        if self.request_timeout_seconds == 0 {
            return Err(ConversaiError::Config(
                "request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.translation.max_chunk_chars == 0 || self.speech.synthesis.max_chunk_chars == 0 {
            return Err(
                ConversaiError::Config("max_chunk_chars must be greater than 0".to_string())
                    .into(),
            );
        }

        let capture = &self.speech.capture;
        if !(capture.energy_threshold > 0.0 && capture.energy_threshold < 1.0) {
            return Err(ConversaiError::Config(
                "speech.capture.energy_threshold must be between 0.0 and 1.0".to_string(),
            )
            .into());
        }

        if capture.phrase_limit_seconds == 0 || capture.listen_timeout_seconds == 0 {
            return Err(ConversaiError::Config(
                "speech.capture timeouts must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Resolve the credential file path
    ///
    /// # Errors
    ///
    /// Returns error if no path is configured and the platform data
    /// directory cannot be determined
    pub fn users_file(&self) -> Result<PathBuf> {
        match &self.auth.users_file {
            Some(path) => Ok(path.clone()),
            None => crate::credentials::CredentialStore::default_path(),
        }
    }
}
