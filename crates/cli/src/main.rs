//! MedAssist CLI
//!
//! Main entry point for the medassist command-line tool.
//! Provides evidence-grounded medical advice and nearby pharmacy lookup.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AdviseCommand, ChatCommand, EvidenceCommand, PharmaciesCommand};
use medassist_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;
use tracing::Instrument;

/// MedAssist - evidence-grounded medical advice from trusted sources
#[derive(Parser, Debug)]
#[command(name = "medassist")]
#[command(about = "Evidence-grounded medical advice and pharmacy lookup", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "MEDASSIST_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "MEDASSIST_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (gemini, ollama)
    #[arg(short, long, global = true, env = "MEDASSIST_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "MEDASSIST_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get advice for a condition, optionally with nearby pharmacies
    Advise(AdviseCommand),

    /// Interactive consultation that remembers earlier answers
    Chat(ChatCommand),

    /// Show the trusted-source evidence retrieved for a condition
    Evidence(EvidenceCommand),

    /// Find pharmacies near a location
    Pharmacies(PharmaciesCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Advise(_) => "advise",
            Commands::Chat(_) => "chat",
            Commands::Evidence(_) => "evidence",
            Commands::Pharmacies(_) => "pharmacies",
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment and config file
    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(
        config.log_level.as_deref(),
        config.no_color,
        config.log_format,
    )?;

    tracing::info!("MedAssist CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let span = tracing::info_span!("command", name = cli.command.name());

    // Route to command handlers
    async {
        let result = match cli.command {
            Commands::Advise(cmd) => cmd.execute(&config).await,
            Commands::Chat(cmd) => cmd.execute(&config).await,
            Commands::Evidence(cmd) => cmd.execute(&config).await,
            Commands::Pharmacies(cmd) => cmd.execute(&config).await,
        };

        match &result {
            Ok(_) => tracing::info!("Command completed successfully"),
            Err(e) => tracing::error!("Command failed: {}", e),
        }
        result
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_advise_with_location() {
        let cli = Cli::try_parse_from(["medassist", "advise", "flu", "--location", "Delhi"]).unwrap();
        match cli.command {
            Commands::Advise(cmd) => {
                assert_eq!(cmd.condition, "flu");
                assert_eq!(cmd.location.as_deref(), Some("Delhi"));
                assert!(!cmd.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_pharmacies_retry_overrides() {
        let cli = Cli::try_parse_from([
            "medassist",
            "pharmacies",
            "Pune",
            "--retries",
            "5",
            "--delay",
            "0.5",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Pharmacies(cmd) => {
                assert_eq!(cmd.retries, Some(5));
                assert_eq!(cmd.delay, Some(0.5));
                assert!(cmd.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_command_span_names() {
        let name = |args: &[&str]| Cli::try_parse_from(args).unwrap().command.name();
        assert_eq!(name(&["medassist", "advise", "flu"]), "advise");
        assert_eq!(name(&["medassist", "chat"]), "chat");
        assert_eq!(name(&["medassist", "evidence", "flu"]), "evidence");
        assert_eq!(name(&["medassist", "pharmacies", "Pune"]), "pharmacies");
    }
}
