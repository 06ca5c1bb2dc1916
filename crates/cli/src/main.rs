//! Anomaly Scorer CLI
//!
//! A command-line tool for scoring operational metric windows,
//! generating synthetic samples and browsing remediation guidance.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{actions, score, simulate};
use scorer_lib::StructuredLogger;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SCORER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Anomaly Scorer CLI
#[derive(Parser)]
#[command(name = "scorer")]
#[command(author, version, about = "Operational metric anomaly scorer", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ~/.config/scorer/config.toml)
    #[arg(long, env = "SCORER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "text")]
    pub format: output::OutputFormat,

    /// Log format (overrides configuration)
    #[arg(long)]
    pub log_format: Option<config::LogFormat>,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score a sample window and report anomalies
    Score(score::ScoreArgs),

    /// Generate a synthetic sample window
    Simulate(simulate::SimulateArgs),

    /// Show remediation guidance
    Actions {
        /// Metric name to look up (lists the whole catalog if omitted)
        metric: Option<String>,
    },
}

fn init_tracing(format: config::LogFormat, verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so reports on stdout stay pipeable
    match format {
        config::LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        config::LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

/// Exit status for operational failures; 1 is reserved for "anomalies found"
const EXIT_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let settings = config::Settings::load(cli.config.as_deref())?;
    init_tracing(cli.log_format.unwrap_or(settings.log_format), cli.verbose);

    let logger = StructuredLogger::new("scorer-cli");
    logger.log_startup(SCORER_VERSION);

    match cli.command {
        Commands::Score(args) => score::run(args, &settings, cli.format).await,
        Commands::Simulate(args) => {
            simulate::run(args).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Actions { metric } => {
            actions::run(metric, cli.format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
