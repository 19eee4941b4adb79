//! Per-session state
//!
//! A [`Session`] holds everything that lives for one interactive run: the
//! logged-in user, the chat transcript, the pending draft, and the current
//! turn settings. It is created at startup and dropped at exit.

use crate::config::SessionConfig;
use crate::language::{Language, LanguageSelection};
use std::collections::VecDeque;
use std::fmt;
use uuid::Uuid;

/// Speaker of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "You"),
            Self::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One immutable transcript entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    role: ChatRole,
    text: String,
}

impl ChatTurn {
    fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Newest-first chat transcript
///
/// The only mutations are recording a whole exchange and clearing.
///
/// # Examples
///
/// ```
/// use conversai::session::{ChatHistory, ChatRole};
///
/// let mut history = ChatHistory::default();
/// history.record_exchange("hello", "hi there");
/// let roles: Vec<ChatRole> = history.iter().map(|t| t.role()).collect();
/// assert_eq!(roles, vec![ChatRole::Assistant, ChatRole::User]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatHistory {
    turns: VecDeque<ChatTurn>,
}

impl ChatHistory {
    /// Record a completed exchange
    ///
    /// The question is pushed to the front, then the answer, so the answer
    /// ends up first.
    pub fn record_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push_front(ChatTurn::new(ChatRole::User, question));
        self.turns
            .push_front(ChatTurn::new(ChatRole::Assistant, answer));
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Turns in storage order (newest first)
    pub fn iter(&self) -> impl Iterator<Item = &ChatTurn> {
        self.turns.iter()
    }
}

/// Settings read at the moment a turn is submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnSettings {
    pub languages: LanguageSelection,
    /// Speak the answer
    pub voice: bool,
    /// Replace the answer by a point-wise summary
    pub summarize: bool,
}

impl TurnSettings {
    pub fn new(question: Language, answer: Language, voice: bool, summarize: bool) -> Self {
        Self {
            languages: LanguageSelection::new(question, answer),
            voice,
            summarize,
        }
    }
}

impl From<&SessionConfig> for TurnSettings {
    fn from(config: &SessionConfig) -> Self {
        Self::new(
            config.question_language,
            config.answer_language,
            config.voice,
            config.summarize,
        )
    }
}

/// State of one interactive session
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    user: Option<String>,
    pub history: ChatHistory,
    /// Pending input shown on the next prompt
    pub draft: String,
    pub settings: TurnSettings,
}

impl Session {
    pub fn new(settings: TurnSettings) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session = %id, "session started");
        Self {
            id,
            user: None,
            history: ChatHistory::default(),
            draft: String::new(),
            settings,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Logged-in user, if any
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Mark `id` as the logged-in user
    ///
    /// Only call this after the credential store has verified the user.
    pub fn login(&mut self, id: impl Into<String>) {
        let id = id.into();
        tracing::info!(session = %self.id, user = %id, "user logged in");
        self.user = Some(id);
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::info!(session = %self.id, user = %user, "user logged out");
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(TurnSettings::default())
    }
}
