/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes four top-level command modules:

- `chat`: Interactive chat mode
- `ask`: Answer a single question and exit
- `account`: Register and log in against the local users file
- `languages`: List supported languages

The handlers turn configuration into adapters and hand them to the turn
orchestrator.
*/

use crate::cli::TurnArgs;
use crate::config::{Config, SessionConfig};
use crate::credentials::CredentialStore;
use crate::error::{ConversaiError, Result};
use crate::orchestrator::{TurnOrchestrator, TurnOutcome};
use crate::providers::create_provider_with_override;
use crate::session::{ChatHistory, ChatRole, TurnSettings};
use crate::speech::{
    create_player, GoogleTts, Speaker, SpeechCapture, SpeechOutput, WhisperRecognizer,
};
use crate::translation::GoogleTranslator;
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;

// Special commands parser for the chat loop
pub mod special_commands;

fn request_timeout(config: &Config) -> Duration {
    Duration::from_secs(config.request_timeout_seconds)
}

/// Build the turn orchestrator described by `config`
///
/// Voice output is optional: if no player can be set up the orchestrator is
/// built without it and voice turns report the problem instead of failing.
///
/// # Errors
///
/// Returns error if the provider or translator cannot be created
pub fn build_orchestrator(
    config: &Config,
    provider_override: Option<&str>,
) -> Result<TurnOrchestrator> {
    let timeout = request_timeout(config);
    let translator = GoogleTranslator::new(config.translation.clone(), timeout)?;
    let provider = create_provider_with_override(&config.provider, provider_override, None, timeout)?;

    let speech: Option<Arc<dyn SpeechOutput>> = match create_player(&config.speech.synthesis) {
        Ok(player) => {
            let tts = GoogleTts::new(config.speech.synthesis.clone(), timeout)?;
            Some(Arc::new(Speaker::new(Arc::new(tts), player)))
        }
        Err(e) => {
            tracing::warn!("Voice output unavailable: {}", e);
            None
        }
    };

    Ok(TurnOrchestrator::new(
        Arc::new(translator),
        Arc::from(provider),
        speech,
    ))
}

/// Build the speech capture pipeline described by `config`
///
/// # Errors
///
/// Returns a `Config` error if no recognition key is configured
pub fn build_speech_capture(config: &Config) -> Result<SpeechCapture> {
    let recognizer =
        WhisperRecognizer::new(config.speech.recognition.clone(), request_timeout(config))?;
    Ok(SpeechCapture::new(
        Arc::new(recognizer),
        config.speech.capture,
    ))
}

/// Merge command-line turn options over the configured session defaults
///
/// Flags can only switch voice and summarize on; the config decides the
/// default.
pub fn resolve_settings(config: &SessionConfig, args: &TurnArgs) -> TurnSettings {
    let defaults = TurnSettings::from(config);
    TurnSettings::new(
        args.question_lang.unwrap_or(defaults.languages.question),
        args.answer_lang.unwrap_or(defaults.languages.answer),
        args.voice || defaults.voice,
        args.summarize || defaults.summarize,
    )
}

/// Print a completed turn's answer
fn print_outcome(outcome: &TurnOutcome) {
    let label = if outcome.summarized {
        "Assistant (summary):"
    } else {
        "Assistant:"
    };
    println!("\n{} {}\n", label.green().bold(), outcome.answer);
    if let Some(err) = &outcome.speech_error {
        eprintln!("{}", format!("Voice output failed: {}", err).yellow());
    }
}

/// Render the transcript in storage order (newest first)
fn print_history(history: &ChatHistory) {
    if history.is_empty() {
        println!("{}", "No messages yet.".yellow());
        return;
    }

    println!();
    for turn in history.iter() {
        let label = match turn.role() {
            ChatRole::User => format!("{}:", turn.role()).cyan().bold(),
            ChatRole::Assistant => format!("{}:", turn.role()).green().bold(),
        };
        println!("{} {}", label, turn.text());
    }
    println!();
}

fn open_store(config: &Config) -> Result<CredentialStore> {
    CredentialStore::open(config.users_file()?)
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Builds the orchestrator, opens the users file, and runs a
    //! readline-based loop. Plain input is submitted as a question; `/`
    //! commands change session settings.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use crate::session::Session;
    use crate::speech::{recognized_or_placeholder, InputSource};
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `turn` - Command-line overrides for languages, toggles, and provider
    ///
    /// # Examples
    ///
    /// ```
    /// use conversai::commands::chat;
    /// use conversai::config::Config;
    ///
    /// // In application code:
    /// // chat::run_chat(Config::default(), Default::default()).await?;
    /// ```
    pub async fn run_chat(config: Config, turn: TurnArgs) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let orchestrator = build_orchestrator(&config, turn.provider.as_deref())?;
        let store = open_store(&config)?;
        let mut session = Session::new(resolve_settings(&config.session, &turn));
        let mut capture: Option<SpeechCapture> = None;

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&session, &orchestrator, config.session.require_login);

        loop {
            let prompt = format_prompt(&session);
            let draft = std::mem::take(&mut session.draft);
            match rl.readline_with_initial(&prompt, (draft.as_str(), "")) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::None => {
                            rl.add_history_entry(trimmed)?;
                            submit(&orchestrator, &mut session, trimmed, &config).await;
                        }
                        SpecialCommand::Listen(path) => {
                            if capture.is_none() {
                                match build_speech_capture(&config) {
                                    Ok(built) => capture = Some(built),
                                    Err(e) => {
                                        eprintln!("{}\n", format!("Error: {}", e).red());
                                        continue;
                                    }
                                }
                            }
                            if let Some(capture) = &capture {
                                listen(capture, &orchestrator, &mut session, path, &config).await;
                            }
                        }
                        SpecialCommand::Voice(value) => {
                            let voice = value.unwrap_or(!session.settings.voice);
                            session.settings.voice = voice;
                            if voice && !orchestrator.can_speak() {
                                println!(
                                    "{}",
                                    "Voice output is on, but no audio player is configured."
                                        .yellow()
                                );
                            }
                            println!("Voice output {}\n", on_off(voice));
                        }
                        SpecialCommand::Summarize(value) => {
                            let summarize = value.unwrap_or(!session.settings.summarize);
                            session.settings.summarize = summarize;
                            println!("Summarize mode {}\n", on_off(summarize));
                        }
                        SpecialCommand::QuestionLanguage(language) => {
                            session.settings.languages.question = language;
                            println!("Question language set to {}\n", language);
                        }
                        SpecialCommand::AnswerLanguage(language) => {
                            session.settings.languages.answer = language;
                            println!("Answer language set to {}\n", language);
                        }
                        SpecialCommand::Languages => super::languages::print_languages(),
                        SpecialCommand::ClearHistory => {
                            session.history.clear();
                            println!("{}\n", "Chat history cleared.".green());
                        }
                        SpecialCommand::ShowHistory => print_history(&session.history),
                        SpecialCommand::Login(id) => {
                            match super::account::read_password(false)
                                .and_then(|password| store.verify(&id, &password))
                            {
                                Ok(true) => {
                                    session.login(&id);
                                    println!("{}\n", format!("Logged in as {}", id).green());
                                }
                                Ok(false) => eprintln!("{}\n", "Invalid credentials".red()),
                                Err(e) => eprintln!("{}\n", format!("Error: {}", e).red()),
                            }
                        }
                        SpecialCommand::Register(id) => {
                            match super::account::read_password(true)
                                .and_then(|password| store.register(&id, &password))
                            {
                                Ok(true) => println!(
                                    "{}\n",
                                    "Registered successfully! Please /login.".green()
                                ),
                                Ok(false) => eprintln!("{}\n", "User already exists".red()),
                                Err(e) => eprintln!("{}\n", format!("Error: {}", e).red()),
                            }
                        }
                        SpecialCommand::Logout => {
                            session.logout();
                            println!("Logged out\n");
                        }
                        SpecialCommand::ShowStatus => {
                            print_status_display(&session, &orchestrator)
                        }
                        SpecialCommand::Help => print_help(),
                        SpecialCommand::Exit => break,
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Submit `query` as a turn, reporting the result
    ///
    /// On failure the query stays in the draft so it is offered again.
    async fn submit(
        orchestrator: &TurnOrchestrator,
        session: &mut Session,
        query: &str,
        config: &Config,
    ) {
        session.draft = query.to_string();

        if config.session.require_login && !session.is_authenticated() {
            eprintln!("{}\n", "Please log in first: /login <id>".yellow());
            return;
        }

        let settings = session.settings;
        match orchestrator.process_turn(session, query, settings).await {
            Ok(Some(outcome)) => print_outcome(&outcome),
            Ok(None) => {}
            Err(e) => eprintln!("{}\n", format!("Error: {}", e).red()),
        }
    }

    async fn listen(
        capture: &SpeechCapture,
        orchestrator: &TurnOrchestrator,
        session: &mut Session,
        path: Option<std::path::PathBuf>,
        config: &Config,
    ) {
        let input = match path {
            Some(path) => InputSource::WavFile(path),
            None => {
                println!("{}", "Listening... speak now".cyan());
                InputSource::Microphone
            }
        };

        let language = session.settings.languages.question;
        match recognized_or_placeholder(capture.listen(input, language).await) {
            Ok((text, None)) => {
                println!("{} {}", "You said:".cyan().bold(), text);
                submit(orchestrator, session, &text, config).await;
            }
            Ok((placeholder, Some(_))) => {
                eprintln!("{}", placeholder.yellow());
                if config.speech.submit_on_recognition_failure {
                    submit(orchestrator, session, &placeholder, config).await;
                } else {
                    session.draft = placeholder;
                }
            }
            Err(e) => eprintln!("{}\n", format!("Error: {}", e).red()),
        }
    }

    fn on_off(value: bool) -> colored::ColoredString {
        if value {
            "ON".green()
        } else {
            "OFF".red()
        }
    }

    /// Prompt showing the current question and answer languages
    fn format_prompt(session: &Session) -> String {
        let languages = session.settings.languages;
        format!(
            "{}→{} >> ",
            languages.question.colored_tag(),
            languages.answer.colored_tag()
        )
    }

    /// Display welcome banner at the start of interactive chat mode
    fn print_welcome_banner(session: &Session, orchestrator: &TurnOrchestrator, require_login: bool) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║          ConversAI Interactive Chat - Welcome!               ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Provider:  {}", orchestrator.provider_label());
        println!(
            "Languages: {} → {}",
            session.settings.languages.question, session.settings.languages.answer
        );
        println!(
            "Voice: {}   Summarize: {}\n",
            on_off(session.settings.voice),
            on_off(session.settings.summarize)
        );
        if require_login {
            println!("{}", "Log in with '/login <id>' before asking questions.".yellow());
        }
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    /// Display detailed status information about the current session
    fn print_status_display(session: &Session, orchestrator: &TurnOrchestrator) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                   ConversAI Session Status                   ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Session:           {}", session.id());
        println!("User:              {}", session.user().unwrap_or("(not logged in)"));
        println!("Provider:          {}", orchestrator.provider_label());
        println!(
            "Question language: {} {}",
            session.settings.languages.question.colored_tag(),
            session.settings.languages.question
        );
        println!(
            "Answer language:   {} {}",
            session.settings.languages.answer.colored_tag(),
            session.settings.languages.answer
        );
        println!("Voice output:      {}", on_off(session.settings.voice));
        println!("Summarize mode:    {}", on_off(session.settings.summarize));
        println!("History:           {} messages", session.history.len());
        println!();
    }

}

// One-shot question handler
pub mod ask {
    use super::*;
    use crate::session::Session;
    use crate::speech::{recognized_or_placeholder, InputSource};
    use std::path::PathBuf;

    /// Answer a single question and print the result
    ///
    /// With `audio_file`, the question is recognized from the WAV file
    /// instead of taken from `query`.
    ///
    /// # Errors
    ///
    /// Returns error if recognition (when not submitting placeholders),
    /// translation, or generation fails
    pub async fn run_ask(
        config: Config,
        query: Option<String>,
        turn: TurnArgs,
        audio_file: Option<PathBuf>,
    ) -> Result<()> {
        let orchestrator = build_orchestrator(&config, turn.provider.as_deref())?;
        let mut session = Session::new(resolve_settings(&config.session, &turn));

        let query = match audio_file {
            Some(path) => {
                let capture = build_speech_capture(&config)?;
                let language = session.settings.languages.question;
                let result = capture.listen(InputSource::WavFile(path), language).await;
                match recognized_or_placeholder(result)? {
                    (text, None) => {
                        eprintln!("{} {}", "You said:".cyan().bold(), text);
                        text
                    }
                    (_, Some(failure)) if !config.speech.submit_on_recognition_failure => {
                        return Err(ConversaiError::Recognition(failure).into());
                    }
                    (placeholder, Some(_)) => {
                        eprintln!("{}", placeholder.yellow());
                        placeholder
                    }
                }
            }
            None => query.unwrap_or_default(),
        };

        let settings = session.settings;
        match orchestrator.process_turn(&mut session, &query, settings).await? {
            Some(outcome) => {
                println!("{}", outcome.answer);
                if let Some(err) = &outcome.speech_error {
                    eprintln!("{}", format!("Voice output failed: {}", err).yellow());
                }
                Ok(())
            }
            None => anyhow::bail!("Question is empty"),
        }
    }

}

// Users file handlers
pub mod account {
    use super::*;

    /// Prompt for a password without echo
    ///
    /// # Errors
    ///
    /// Returns error if the terminal cannot be read
    pub fn read_password(confirm: bool) -> Result<String> {
        let prompt = dialoguer::Password::new().with_prompt("Password");
        let prompt = if confirm {
            prompt.with_confirmation("Confirm password", "Passwords do not match")
        } else {
            prompt
        };
        Ok(prompt.interact()?)
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// Returns an `Auth` error if the identifier is taken, or a `Storage`
    /// error if the users file cannot be written
    pub fn register(config: &Config, id: &str, password: Option<String>) -> Result<()> {
        let store = open_store(config)?;
        let password = match password {
            Some(password) => password,
            None => read_password(true)?,
        };

        if store.register(id, &password)? {
            println!("{}", "Registered successfully! Please login.".green());
            Ok(())
        } else {
            Err(ConversaiError::Auth("User already exists".to_string()).into())
        }
    }

    /// Check a user's credentials
    ///
    /// # Errors
    ///
    /// Returns an `Auth` error on a mismatch, or a `Storage` error if the
    /// users file cannot be read
    pub fn login(config: &Config, id: &str, password: Option<String>) -> Result<()> {
        let store = open_store(config)?;
        let password = match password {
            Some(password) => password,
            None => read_password(false)?,
        };

        if store.verify(id, &password)? {
            println!("{}", format!("Logged in as {}", id).green());
            Ok(())
        } else {
            Err(ConversaiError::Auth("Invalid credentials".to_string()).into())
        }
    }

}

// Language listing
pub mod languages {
    use crate::language::{Language, PIVOT_LANGUAGE};
    use prettytable::{format, row, Table};

    /// Print the supported languages as a table
    pub fn print_languages() {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
        table.set_titles(row!["Code", "Language", ""]);

        for language in Language::ALL {
            let note = if language == PIVOT_LANGUAGE {
                "pivot"
            } else {
                ""
            };
            table.add_row(row![language.code(), language.name(), note]);
        }

        println!("\nSupported languages:\n");
        table.printstd();
        println!();
    }
}
