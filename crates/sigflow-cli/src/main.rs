mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "sigflow",
    version,
    about = "Configuration-driven ETL for financial and sentiment signals"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = logging::LogFormat::Text, global = true)]
    log_format: logging::LogFormat,

    /// Do not load a .env file from the working directory
    #[arg(long, global = true)]
    no_dotenv: bool,
}

/// Which configuration to read and which signals to pick from it.
#[derive(Args)]
struct Selection {
    /// Signal file or directory of signal files (repeatable, merged in order)
    #[arg(short, long = "config", default_value = "config/signals.yaml")]
    config: Vec<PathBuf>,

    /// Only these signals (repeatable; default: all)
    #[arg(short, long = "signal")]
    signal: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run signal pipelines
    Run {
        #[command(flatten)]
        selection: Selection,
        /// Extract and transform only; print the normalized data instead of loading it
        #[arg(long)]
        dry_run: bool,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate configuration and resolve every component without running
    Check {
        #[command(flatten)]
        selection: Selection,
    },
    /// List built-in component aliases
    Components {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    if !cli.no_dotenv {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();
    }
    logging::init(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Run {
            selection,
            dry_run,
            json,
        } => commands::run::execute(&selection.config, &selection.signal, dry_run, json).await,
        Commands::Check { selection } => {
            commands::check::execute(&selection.config, &selection.signal)
        }
        Commands::Components { json } => commands::components::execute(json),
    }
}
