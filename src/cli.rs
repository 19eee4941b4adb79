//! Command-line interface definition for ConversAI
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions,
//! and the local user registry.

use crate::language::Language;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ConversAI - multilingual voice and text assistant
///
/// Ask questions in one language and get answers in another, optionally
/// summarized and spoken aloud.
#[derive(Parser, Debug, Clone)]
#[command(name = "conversai")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the users file location
    #[arg(long, global = true)]
    pub users_file: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Per-turn options shared by `chat` and `ask`
///
/// Anything left unset falls back to the `session` section of the config.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct TurnArgs {
    /// Language the question is asked in (name or code)
    #[arg(short, long = "question-lang", value_parser = Language::parse_str)]
    pub question_lang: Option<Language>,

    /// Language the answer is delivered in (name or code)
    #[arg(short, long = "answer-lang", value_parser = Language::parse_str)]
    pub answer_lang: Option<Language>,

    /// Speak the answer aloud
    #[arg(long)]
    pub voice: bool,

    /// Summarize the answer in points
    #[arg(short, long)]
    pub summarize: bool,

    /// Override the provider from config (gemini, ollama)
    #[arg(short, long)]
    pub provider: Option<String>,
}

/// Available commands for ConversAI
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        #[command(flatten)]
        turn: TurnArgs,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question text (omit when using --audio-file)
        #[arg(required_unless_present = "audio_file")]
        query: Option<String>,

        #[command(flatten)]
        turn: TurnArgs,

        /// Recognize the question from a WAV file instead
        #[arg(long)]
        audio_file: Option<PathBuf>,
    },

    /// Register a new user
    Register {
        /// User identifier (usually an email address)
        id: String,

        /// Secret for non-interactive use; prompts when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Check a user's credentials
    Login {
        /// User identifier
        id: String,

        /// Secret for non-interactive use; prompts when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// List supported languages
    Languages,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            users_file: None,
            command: Commands::Languages,
        }
    }
}
