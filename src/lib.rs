//! ConversAI - Multilingual voice and chat assistant library
//!
//! This library provides the core functionality for ConversAI: a question in
//! any supported language is translated to English, answered by a generative
//! model, optionally summarized, translated into the answer language, and
//! optionally spoken aloud.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `orchestrator`: Turn sequencing (translate, generate, summarize, speak)
//! - `providers`: Generative model abstraction and implementations (Gemini, Ollama)
//! - `translation`: Machine translation adapter
//! - `speech`: Audio capture, endpointing, recognition, synthesis, and playback
//! - `session`: Per-session state and chat history
//! - `credentials`: Local user registration and login
//! - `language`: The closed set of supported languages
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use conversai::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let orchestrator = conversai::commands::build_orchestrator(&config, None)?;
//!     println!("Using {}", orchestrator.provider_label());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod language;
pub mod orchestrator;
pub mod providers;
pub mod session;
pub mod speech;
pub mod text;
pub mod translation;

// Re-export commonly used types
pub use config::Config;
pub use credentials::CredentialStore;
pub use error::{ConversaiError, RecognitionFailure, Result};
pub use language::{Language, LanguageSelection, PIVOT_LANGUAGE};
pub use orchestrator::{TurnOrchestrator, TurnOutcome};
pub use session::{ChatHistory, ChatRole, Session, TurnSettings};

#[cfg(test)]
pub mod test_utils;
