//! Base provider trait and common types for ConversAI
//!
//! This module defines the Provider trait that all generation backends
//! must implement, plus the small message type the chat-style backends share.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message structure for chat-style backends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (user, assistant)
    pub role: String,
    /// Content of the message
    #[serde(default)]
    pub content: String,
}

impl Message {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use conversai::providers::Message;
    ///
    /// let msg = Message::user("Hello, assistant!");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Generative model backend
///
/// Every call is single-shot and stateless: no conversation history is
/// sent, so two calls with the same prompt are independent requests.
///
/// # Examples
///
/// ```no_run
/// use conversai::providers::Provider;
///
/// # async fn example(provider: &dyn Provider) -> conversai::error::Result<()> {
/// let answer = provider.generate("What causes rain?").await?;
/// println!("{}", answer);
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate a completion for a single prompt
    ///
    /// # Errors
    ///
    /// Returns a `Generation` error if the request fails, the backend
    /// answers with a non-success status, or the reply holds no text
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Short backend identifier ("gemini", "ollama")
    fn name(&self) -> &'static str;

    /// Model the backend is configured to use
    fn model(&self) -> String;
}
