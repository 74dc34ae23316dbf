//! orbitus
//!
//! Command-line entry point: loads settings, installs logging and runs one
//! subcommand.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use orbitus::{
    commands::{self, QueryArgs},
    config::Settings,
    logging::RotatingFileWriter,
};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// orbitus
///
/// Run GraphQL documents through a pool of per-credential clients.
#[derive(Parser, Debug)]
#[command(name = "orbitus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./orbitus.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error (overrides ORBITUS_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log file path for JSON logs (enables file logging with 10MB rotation)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write an orbitus.toml template into the current directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Run a GraphQL document and print the JSON response
    Query(QueryArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (before logging, so we can use log_level)
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(log_level) = cli.log_level {
        settings.log_level = log_level;
    }

    init_tracing(&settings.log_level, cli.log_file.as_ref())?;

    tracing::debug!(
        app_name = %settings.app_name,
        version = %settings.app_version,
        "Starting orbitus"
    );

    match cli.command {
        Command::Init { force } => {
            let dir = std::env::current_dir().context("Failed to resolve current directory")?;
            let path = commands::init::run(&dir, force)?;
            eprintln!("Wrote {}", path.display());
        }
        Command::Query(args) => {
            let response = commands::query::run(&settings, &args).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

/// Initialize tracing subscriber with the specified log level
/// Console logs go to stderr; optionally also to a rotating file (10MB per file, 5 kept)
fn init_tracing(log_level: &str, log_file: Option<&PathBuf>) -> Result<()> {
    // Build filter from RUST_LOG env var or use provided log level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    // Console layer - always enabled, JSON format, kept off stdout
    let console_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    let subscriber = tracing_subscriber::registry().with(console_layer);

    if let Some(path) = log_file {
        let file_writer = RotatingFileWriter::with_defaults(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        let file_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_filter(file_filter);

        subscriber.with(file_layer).init();
    } else {
        subscriber.init();
    }

    Ok(())
}
