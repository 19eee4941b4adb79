//! Turn orchestration
//!
//! One turn runs strictly in order:
//! translate question -> generate -> (summarize) -> translate answer ->
//! (speak) -> record history -> clear draft.
//!
//! A translation or generation failure aborts the turn before any session
//! state changes. A speech failure is reported in the outcome and the turn
//! still completes.

use crate::error::Result;
use crate::language::PIVOT_LANGUAGE;
use crate::providers::Provider;
use crate::session::{Session, TurnSettings};
use crate::speech::SpeechOutput;
use crate::translation::Translator;
use std::fmt;
use std::sync::Arc;

/// Prefix of the second generation request in summarize mode
pub const SUMMARY_PROMPT_PREFIX: &str = "Summarize this in points:\n";

/// Stage of a running turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    TranslatingQuestion,
    Generating,
    Summarizing,
    TranslatingAnswer,
    Synthesizing,
    AppendingHistory,
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TranslatingQuestion => "translating question",
            Self::Generating => "generating",
            Self::Summarizing => "summarizing",
            Self::TranslatingAnswer => "translating answer",
            Self::Synthesizing => "synthesizing",
            Self::AppendingHistory => "appending history",
        };
        f.write_str(name)
    }
}

/// Result of a completed turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// The question as submitted
    pub question: String,
    /// The question in the pivot language
    pub translated_question: String,
    /// The answer in the answer language
    pub answer: String,
    pub summarized: bool,
    /// Whether the answer was played back
    pub spoken: bool,
    /// Why speaking failed, when voice output was requested
    pub speech_error: Option<String>,
}

/// Sequences the adapters for one query
pub struct TurnOrchestrator {
    translator: Arc<dyn Translator>,
    provider: Arc<dyn Provider>,
    speech: Option<Arc<dyn SpeechOutput>>,
}

impl TurnOrchestrator {
    pub fn new(
        translator: Arc<dyn Translator>,
        provider: Arc<dyn Provider>,
        speech: Option<Arc<dyn SpeechOutput>>,
    ) -> Self {
        Self {
            translator,
            provider,
            speech,
        }
    }

    /// Name and model of the generation backend
    pub fn provider_label(&self) -> String {
        format!("{} ({})", self.provider.name(), self.provider.model())
    }

    /// Whether voice output is available
    pub fn can_speak(&self) -> bool {
        self.speech.is_some()
    }

    /// Run one turn for `query`
    ///
    /// Returns `Ok(None)` without calling anything when `query` is blank.
    ///
    /// # Errors
    ///
    /// Returns the `Translation` or `Generation` error that aborted the
    /// turn; `session` is left untouched in that case
    pub async fn process_turn(
        &self,
        session: &mut Session,
        query: &str,
        settings: TurnSettings,
    ) -> Result<Option<TurnOutcome>> {
        if query.trim().is_empty() {
            tracing::debug!("empty query, nothing to do");
            return Ok(None);
        }

        let languages = settings.languages;

        tracing::debug!(stage = %TurnStage::TranslatingQuestion, from = languages.question.code());
        let translated_question = self
            .translator
            .translate(query, languages.question, PIVOT_LANGUAGE)
            .await?;

        tracing::debug!(stage = %TurnStage::Generating, provider = self.provider.name());
        let mut answer = self.provider.generate(&translated_question).await?;

        if settings.summarize {
            tracing::debug!(stage = %TurnStage::Summarizing);
            let prompt = format!("{}{}", SUMMARY_PROMPT_PREFIX, answer);
            answer = self.provider.generate(&prompt).await?;
        }

        tracing::debug!(stage = %TurnStage::TranslatingAnswer, to = languages.answer.code());
        let final_answer = self
            .translator
            .translate(&answer, PIVOT_LANGUAGE, languages.answer)
            .await?;

        let mut spoken = false;
        let mut speech_error = None;
        if settings.voice {
            tracing::debug!(stage = %TurnStage::Synthesizing);
            match &self.speech {
                Some(speech) => match speech.speak(&final_answer, languages.answer).await {
                    Ok(()) => spoken = true,
                    Err(e) => {
                        tracing::warn!("Voice output failed: {:#}", e);
                        speech_error = Some(e.to_string());
                    }
                },
                None => speech_error = Some("voice output is not configured".to_string()),
            }
        }

        tracing::debug!(stage = %TurnStage::AppendingHistory, session = %session.id());
        session.history.record_exchange(query, final_answer.clone());
        session.draft.clear();

        Ok(Some(TurnOutcome {
            question: query.to_string(),
            translated_question,
            answer: final_answer,
            summarized: settings.summarize,
            spoken,
            speech_error,
        }))
    }
}
