//! navcap - operator tool for the activity capture log.

mod commands;
mod error;
mod replay;

use clap::{ArgAction, Parser, Subcommand};
use error::CliError;
use navcap_core::export::DEFAULT_RECENT;
use navcap_core::{CaptureConfig, ControlCommand, FileStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_STORE_FILE: &str = "navcap_store.json";

#[derive(Debug, Parser)]
#[command(name = "navcap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Capture and inspect a bounded log of page activity", long_about = None)]
struct Cli {
    /// Sets the level of verbosity
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Capture configuration (TOML)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// JSON file backing the store; overrides `store_path` from the config
    #[arg(short, long, value_name = "FILE", global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Enable tracking
    Start {
        /// Page the command is issued from
        #[arg(long, default_value = "about:blank")]
        url: String,
    },

    /// Disable tracking
    Stop {
        #[arg(long, default_value = "about:blank")]
        url: String,
    },

    /// Empty the event log
    Clear {
        #[arg(long, default_value = "about:blank")]
        url: String,
    },

    /// Show the most recent events, newest first
    List {
        #[arg(short, long, default_value_t = DEFAULT_RECENT)]
        recent: usize,
    },

    /// Write the event log as pretty JSON
    Export {
        /// Output file; defaults to the configured export file name
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Replay a recorded signal script through the capture pipeline
    Replay {
        #[arg(long, value_name = "FILE")]
        script: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => CaptureConfig::from_file(path)?,
        None => CaptureConfig::default(),
    };
    let store_path = cli
        .store
        .clone()
        .or_else(|| config.store_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE));
    info!(store = ?store_path, "Using file store");
    let store = Arc::new(FileStore::new(&store_path));

    match cli.command {
        Commands::Start { url } => {
            let ack = commands::control(store, config, &url, ControlCommand::Start).await?;
            println!("Tracking started ({})", ack.result);
        }
        Commands::Stop { url } => {
            let ack = commands::control(store, config, &url, ControlCommand::Stop).await?;
            println!("Tracking stopped ({})", ack.result);
        }
        Commands::Clear { url } => {
            let ack = commands::control(store, config, &url, ControlCommand::Clear).await?;
            println!("Events cleared ({})", ack.result);
        }
        Commands::List { recent } => {
            let lines = commands::list(store.as_ref(), recent).await?;
            if lines.is_empty() {
                println!("No events recorded yet.");
            } else {
                for line in lines {
                    println!("{}", line);
                }
            }
        }
        Commands::Export { out } => {
            let (path, count) = commands::export(store.as_ref(), &config, out).await?;
            println!("Exported {} events to {}", count, path.display());
        }
        Commands::Replay { script } => {
            let script = replay::ReplayScript::from_file(&script)?;
            let report = replay::run(store, config, script).await?;
            println!(
                "Session {}: replayed {} steps, log holds {} events",
                report.session_id,
                report.steps,
                report.events.len()
            );
        }
    }

    Ok(())
}
