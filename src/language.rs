//! Supported human languages
//!
//! The assistant works with a fixed, closed set of languages. Every code
//! handed to translation or speech services comes from [`Language`], so an
//! unsupported code can only appear while parsing configuration or user
//! input, never at call time.

use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A supported question/answer language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    English,
    Hindi,
    Bengali,
    Gujarati,
    Tamil,
    Telugu,
    Marathi,
    Punjabi,
    Kannada,
    Malayalam,
    Urdu,
}

/// Language every question is translated into before generation
pub const PIVOT_LANGUAGE: Language = Language::English;

impl Language {
    /// All supported languages in display order
    pub const ALL: [Language; 11] = [
        Language::English,
        Language::Hindi,
        Language::Bengali,
        Language::Gujarati,
        Language::Tamil,
        Language::Telugu,
        Language::Marathi,
        Language::Punjabi,
        Language::Kannada,
        Language::Malayalam,
        Language::Urdu,
    ];

    /// ISO 639-1 code used by translation and speech services
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Bengali => "bn",
            Self::Gujarati => "gu",
            Self::Tamil => "ta",
            Self::Telugu => "te",
            Self::Marathi => "mr",
            Self::Punjabi => "pa",
            Self::Kannada => "kn",
            Self::Malayalam => "ml",
            Self::Urdu => "ur",
        }
    }

    /// English display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Bengali => "Bengali",
            Self::Gujarati => "Gujarati",
            Self::Tamil => "Tamil",
            Self::Telugu => "Telugu",
            Self::Marathi => "Marathi",
            Self::Punjabi => "Punjabi",
            Self::Kannada => "Kannada",
            Self::Malayalam => "Malayalam",
            Self::Urdu => "Urdu",
        }
    }

    /// Parse a language from its display name or code
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use conversai::language::Language;
    ///
    /// assert_eq!(Language::parse_str("hi").unwrap(), Language::Hindi);
    /// assert_eq!(Language::parse_str("Tamil").unwrap(), Language::Tamil);
    /// assert!(Language::parse_str("klingon").is_err());
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, String> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|lang| lang.code() == needle || lang.name().to_lowercase() == needle)
            .ok_or_else(|| format!("Unsupported language: {}", s.trim()))
    }

    /// Colored tag for prompts and status output
    pub fn colored_tag(&self) -> String {
        format!("[{}]", self.code().to_uppercase().cyan())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl TryFrom<String> for Language {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_str(&value)
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.code().to_string()
    }
}

/// Independent question and answer language choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSelection {
    /// Language the user asks in
    pub question: Language,
    /// Language the answer is delivered in
    pub answer: Language,
}

impl LanguageSelection {
    pub fn new(question: Language, answer: Language) -> Self {
        Self { question, answer }
    }
}

impl Default for LanguageSelection {
    fn default() -> Self {
        Self::new(Language::English, Language::English)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_languages_have_unique_codes() {
        let mut codes: Vec<&str> = Language::ALL.iter().map(|l| l.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), Language::ALL.len());
    }

    #[test]
    fn test_parse_by_code_and_name() {
        for lang in Language::ALL {
            assert_eq!(Language::parse_str(lang.code()).unwrap(), lang);
            assert_eq!(Language::parse_str(lang.name()).unwrap(), lang);
            assert_eq!(
                Language::parse_str(&lang.name().to_uppercase()).unwrap(),
                lang
            );
        }
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(Language::parse_str("  ur ").unwrap(), Language::Urdu);
    }

    #[test]
    fn test_parse_unsupported() {
        let err = Language::parse_str("fr").unwrap_err();
        assert!(err.contains("Unsupported language"));
    }

    #[test]
    fn test_pivot_is_english() {
        assert_eq!(PIVOT_LANGUAGE.code(), "en");
    }

    #[test]
    fn test_serde_uses_code() {
        let yaml = serde_yaml::to_string(&Language::Kannada).unwrap();
        assert_eq!(yaml.trim(), "kn");
        let lang: Language = serde_yaml::from_str("Malayalam").unwrap();
        assert_eq!(lang, Language::Malayalam);
        assert!(serde_yaml::from_str::<Language>("xx").is_err());
    }

    #[test]
    fn test_default_selection_is_english() {
        let selection = LanguageSelection::default();
        assert_eq!(selection.question, Language::English);
        assert_eq!(selection.answer, Language::English);
    }
}
