//! Command-line client for Rossum Elis invoice extraction.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use rossum_core::{ErrorKind, RossumError};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use commands::{batch, config, extract};

/// Rossum CLI - extract structured data from invoices with the Elis API
#[derive(Parser)]
#[command(name = "rossum")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a single document
    Extract(extract::ExtractArgs),

    /// Extract multiple documents
    Batch(batch::BatchArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity, RUST_LOG wins when set
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to initialize logging: {}", e);
    }

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Extract(args) => extract::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let kind = error_kind(&err);
            let label = kind.map_or_else(|| "Error".to_string(), |k| k.to_string());
            eprintln!("{} {}: {:#}", style("✗").red(), label, err);
            ExitCode::from(exit_code(kind))
        }
    }
}

fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.downcast_ref::<RossumError>().map(RossumError::kind)
}

/// Process exit status for an error kind (sysexits-style).
fn exit_code(kind: Option<ErrorKind>) -> u8 {
    match kind {
        Some(ErrorKind::Validation) => 64,
        Some(ErrorKind::ExtractionFailed) => 65,
        Some(ErrorKind::Network) => 69,
        Some(ErrorKind::Io) => 74,
        Some(ErrorKind::Timeout) => 75,
        Some(ErrorKind::Parse) => 76,
        Some(ErrorKind::Auth) => 77,
        Some(ErrorKind::Config) => 78,
        Some(ErrorKind::Cancelled) => 130,
        None => 1,
    }
}
