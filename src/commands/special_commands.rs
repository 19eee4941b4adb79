//! Special commands parser for interactive chat mode
//!
//! This module parses and handles special commands that can be entered during
//! interactive chat sessions. Special commands allow users to:
//! - Speak a question through the microphone or a WAV file
//! - Toggle voice output and summarize mode
//! - Change the question and answer languages
//! - Log in, register, and log out
//! - View or clear the transcript
//! - Exit the session
//!
//! Commands are prefixed with `/` and are case-insensitive. Arguments such
//! as user identifiers and file paths keep their original case.

use crate::language::Language;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
///
/// These commands modify the session state or provide information,
/// rather than being submitted as a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Capture a spoken question
    ///
    /// Without a path the default microphone is used.
    Listen(Option<PathBuf>),

    /// Turn voice output on or off; `None` toggles
    Voice(Option<bool>),

    /// Turn summarize mode on or off; `None` toggles
    Summarize(Option<bool>),

    /// Change the language questions are asked in
    QuestionLanguage(Language),

    /// Change the language answers are delivered in
    AnswerLanguage(Language),

    /// List supported languages
    Languages,

    /// Empty the transcript
    ClearHistory,

    /// Print the transcript
    ShowHistory,

    /// Log in as an existing user
    Login(String),

    /// Register a new user
    Register(String),

    /// Forget the logged-in user
    Logout,

    /// Display current session settings
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be submitted as a question.
    None,
}

fn parse_switch(command: &str, arg: &str) -> Result<Option<bool>, CommandError> {
    match arg.to_lowercase().as_str() {
        "" => Ok(None),
        "on" | "enable" => Ok(Some(true)),
        "off" | "disable" => Ok(Some(false)),
        other => Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: other.to_string(),
        }),
    }
}

fn require_arg(command: &str, arg: &str, usage: &str) -> Result<String, CommandError> {
    if arg.is_empty() {
        Err(CommandError::MissingArgument {
            command: command.to_string(),
            usage: usage.to_string(),
        })
    } else {
        Ok(arg.to_string())
    }
}

fn parse_lang(arg: &str) -> Result<SpecialCommand, CommandError> {
    const USAGE: &str = "/lang <question|answer> <language>";

    let mut parts = arg.splitn(2, char::is_whitespace);
    let which = parts.next().unwrap_or_default().to_lowercase();
    let value = parts.next().unwrap_or_default().trim();

    if which.is_empty() {
        return Err(CommandError::MissingArgument {
            command: "/lang".to_string(),
            usage: USAGE.to_string(),
        });
    }
    if which != "question" && which != "answer" {
        return Err(CommandError::UnsupportedArgument {
            command: "/lang".to_string(),
            arg: which,
        });
    }
    if value.is_empty() {
        return Err(CommandError::MissingArgument {
            command: format!("/lang {}", which),
            usage: USAGE.to_string(),
        });
    }

    let language = Language::parse_str(value).map_err(|_| CommandError::UnsupportedArgument {
        command: format!("/lang {}", which),
        arg: value.to_string(),
    })?;

    if which == "question" {
        Ok(SpecialCommand::QuestionLanguage(language))
    } else {
        Ok(SpecialCommand::AnswerLanguage(language))
    }
}

/// Parse a user input string into a special command
///
/// # Returns
///
/// Returns Ok(SpecialCommand) for valid commands or SpecialCommand::None for non-commands.
///
/// # Errors
///
/// Returns CommandError::UnknownCommand if input starts with "/" but is not a valid command.
/// Returns CommandError::UnsupportedArgument if a command receives an invalid argument.
/// Returns CommandError::MissingArgument if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use conversai::commands::special_commands::{parse_special_command, SpecialCommand};
/// use conversai::language::Language;
///
/// let cmd = parse_special_command("/lang answer Tamil").unwrap();
/// assert_eq!(cmd, SpecialCommand::AnswerLanguage(Language::Tamil));
///
/// let cmd = parse_special_command("/voice on").unwrap();
/// assert_eq!(cmd, SpecialCommand::Voice(Some(true)));
///
/// let cmd = parse_special_command("what is monsoon?").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// // Invalid command returns error
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // If input doesn't start with "/", it's not a command (except exit/quit)
    if !trimmed.starts_with('/') {
        return match lower.as_str() {
            "exit" | "quit" => Ok(SpecialCommand::Exit),
            _ => Ok(SpecialCommand::None),
        };
    }

    let (command, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((command, arg)) => (command.to_lowercase(), arg.trim()),
        None => (lower.clone(), ""),
    };

    match command.as_str() {
        "/mic" | "/listen" => {
            let path = (!arg.is_empty()).then(|| PathBuf::from(arg));
            Ok(SpecialCommand::Listen(path))
        }
        "/voice" => Ok(SpecialCommand::Voice(parse_switch("/voice", arg)?)),
        "/summarize" | "/summary" => Ok(SpecialCommand::Summarize(parse_switch("/summarize", arg)?)),
        "/lang" | "/language" => parse_lang(arg),
        "/languages" => Ok(SpecialCommand::Languages),
        "/clear" => Ok(SpecialCommand::ClearHistory),
        "/history" => Ok(SpecialCommand::ShowHistory),
        "/login" => Ok(SpecialCommand::Login(require_arg("/login", arg, "/login <id>")?)),
        "/register" => Ok(SpecialCommand::Register(require_arg(
            "/register",
            arg,
            "/register <id>",
        )?)),
        "/logout" => Ok(SpecialCommand::Logout),
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

/// Display help text for special commands
///
/// Shows all available special commands with their descriptions
/// and usage examples.
///
/// # Examples
///
/// ```
/// use conversai::commands::special_commands::print_help;
///
/// print_help();
/// ```
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

ASKING:
  <text>                 - Ask a question in the current question language
  /mic                   - Speak a question through the microphone
  /mic <file.wav>        - Recognize a question from a WAV file

ANSWERS:
  /voice [on|off]        - Speak answers aloud (no argument toggles)
  /summarize [on|off]    - Summarize answers in points (no argument toggles)

LANGUAGES:
  /lang question <lang>  - Set the language you ask in
  /lang answer <lang>    - Set the language answers are given in
  /languages             - List supported languages

TRANSCRIPT:
  /history               - Show the chat transcript (newest first)
  /clear                 - Clear the chat transcript

ACCOUNT:
  /login <id>            - Log in (prompts for the password)
  /register <id>         - Register a new user (prompts for the password)
  /logout                - Log out

SESSION:
  /status                - Show current session settings
  /help                  - Show this help message
  exit, quit             - Exit the session

Languages may be given by name or code, e.g. 'Hindi' or 'hi'.
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(
            parse_special_command("tell me about Kerala").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_parse_exit_and_quit() {
        for input in ["exit", "QUIT", "/exit", "/quit", "  exit  "] {
            assert_eq!(parse_special_command(input).unwrap(), SpecialCommand::Exit);
        }
    }

    #[test]
    fn test_parse_mic_default_device() {
        assert_eq!(
            parse_special_command("/mic").unwrap(),
            SpecialCommand::Listen(None)
        );
    }

    #[test]
    fn test_parse_mic_keeps_path_case() {
        assert_eq!(
            parse_special_command("/MIC Recordings/Q1.wav").unwrap(),
            SpecialCommand::Listen(Some(PathBuf::from("Recordings/Q1.wav")))
        );
    }

    #[test]
    fn test_parse_voice_switches() {
        assert_eq!(parse_special_command("/voice").unwrap(), SpecialCommand::Voice(None));
        assert_eq!(
            parse_special_command("/voice ON").unwrap(),
            SpecialCommand::Voice(Some(true))
        );
        assert_eq!(
            parse_special_command("/voice off").unwrap(),
            SpecialCommand::Voice(Some(false))
        );
    }

    #[test]
    fn test_parse_voice_invalid_argument() {
        let err = parse_special_command("/voice loud").unwrap_err();
        assert_eq!(
            err,
            CommandError::UnsupportedArgument {
                command: "/voice".to_string(),
                arg: "loud".to_string()
            }
        );
    }

    #[test]
    fn test_parse_summarize() {
        assert_eq!(
            parse_special_command("/summarize on").unwrap(),
            SpecialCommand::Summarize(Some(true))
        );
        assert_eq!(
            parse_special_command("/summary").unwrap(),
            SpecialCommand::Summarize(None)
        );
    }

    #[test]
    fn test_parse_lang_question_and_answer() {
        assert_eq!(
            parse_special_command("/lang question hi").unwrap(),
            SpecialCommand::QuestionLanguage(Language::Hindi)
        );
        assert_eq!(
            parse_special_command("/LANG Answer malayalam").unwrap(),
            SpecialCommand::AnswerLanguage(Language::Malayalam)
        );
    }

    #[test]
    fn test_parse_lang_errors() {
        assert!(matches!(
            parse_special_command("/lang").unwrap_err(),
            CommandError::MissingArgument { .. }
        ));
        assert!(matches!(
            parse_special_command("/lang answer").unwrap_err(),
            CommandError::MissingArgument { .. }
        ));
        assert!(matches!(
            parse_special_command("/lang target hi").unwrap_err(),
            CommandError::UnsupportedArgument { .. }
        ));
        assert!(matches!(
            parse_special_command("/lang answer french").unwrap_err(),
            CommandError::UnsupportedArgument { .. }
        ));
    }

    #[test]
    fn test_parse_login_keeps_identifier_case() {
        assert_eq!(
            parse_special_command("/login Asha@Example.com").unwrap(),
            SpecialCommand::Login("Asha@Example.com".to_string())
        );
    }

    #[test]
    fn test_parse_login_requires_identifier() {
        let err = parse_special_command("/login").unwrap_err();
        assert!(err.to_string().contains("/login <id>"));
    }

    #[test]
    fn test_parse_register_and_logout() {
        assert_eq!(
            parse_special_command("/register new@user.in").unwrap(),
            SpecialCommand::Register("new@user.in".to_string())
        );
        assert_eq!(parse_special_command("/logout").unwrap(), SpecialCommand::Logout);
    }

    #[test]
    fn test_parse_session_commands() {
        assert_eq!(parse_special_command("/clear").unwrap(), SpecialCommand::ClearHistory);
        assert_eq!(parse_special_command("/history").unwrap(), SpecialCommand::ShowHistory);
        assert_eq!(parse_special_command("/languages").unwrap(), SpecialCommand::Languages);
        assert_eq!(parse_special_command("/status").unwrap(), SpecialCommand::ShowStatus);
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
    }

    #[test]
    fn test_parse_unknown_command() {
        let err = parse_special_command("/mode write").unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("/mode".to_string()));
    }

    #[test]
    fn test_command_error_messages() {
        let err = CommandError::MissingArgument {
            command: "/register".to_string(),
            usage: "/register <id>".to_string(),
        };
        assert!(err.to_string().contains("Usage: /register <id>"));
    }
}
