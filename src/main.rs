//! ConversAI - Multilingual voice and chat assistant
//!
#![doc = "ConversAI - Multilingual voice and chat assistant"]
#![doc = "Main entry point for the ConversAI application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use conversai::cli::{Cli, Commands};
use conversai::commands;
use conversai::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Chat { turn } => {
            if let Some(p) = &turn.provider {
                tracing::debug!("Using provider override: {}", p);
            }
            commands::chat::run_chat(config, turn).await?;
            Ok(())
        }
        Commands::Ask {
            query,
            turn,
            audio_file,
        } => {
            tracing::info!("Answering a single question");
            if let Some(path) = &audio_file {
                tracing::debug!("Reading question from: {}", path.display());
            }
            commands::ask::run_ask(config, query, turn, audio_file).await?;
            Ok(())
        }
        Commands::Register { id, password } => {
            tracing::info!("Registering user");
            commands::account::register(&config, &id, password)?;
            Ok(())
        }
        Commands::Login { id, password } => {
            tracing::info!("Checking credentials");
            commands::account::login(&config, &id, password)?;
            Ok(())
        }
        Commands::Languages => {
            commands::languages::print_languages();
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so answers on stdout stay clean for piping.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "conversai=debug"
    } else {
        "conversai=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
