//! Test utilities for ConversAI
//!
//! This module provides common test utilities including temporary directory
//! management, test file creation, and assertion helpers.

use crate::config::Config;
use crate::error::ConversaiError;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// The directory is removed when the returned `TempDir` is dropped.
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T, ConversaiError>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Create a test configuration that never touches the user's data directory
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.provider.provider_type = "ollama".to_string();
    config.auth.users_file = Some(dir.path().join("users.json"));
    config
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
provider:
  type: ollama
  gemini:
    model: gemini-1.5-flash
  ollama:
    host: http://localhost:11434
    model: llama3.2:latest

translation:
  max_chunk_chars: 4500

speech:
  synthesis:
    max_chunk_chars: 100
    player_command: ["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet"]
  capture:
    energy_threshold: 0.02
    pause_threshold_ms: 800
    listen_timeout_seconds: 5
    phrase_limit_seconds: 30
  submit_on_recognition_failure: true

session:
  question_language: hi
  answer_language: en
  voice: false
  summarize: true

request_timeout_seconds: 30
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert!(path.exists());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "content");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<(), ConversaiError> =
            Err(ConversaiError::Config("test error message".to_string()));
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        let result: Result<(), ConversaiError> = Ok(());
        assert_error_contains(result, "error");
    }

    #[test]
    fn test_test_config() {
        let dir = temp_dir();
        let config = test_config(&dir);
        assert_eq!(config.provider.provider_type, "ollama");
        assert!(config.users_file().unwrap().starts_with(dir.path()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_test_config_yaml() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.question_language, Language::Hindi);
        assert!(config.session.summarize);
        assert_eq!(config.request_timeout_seconds, 30);
    }
}
