//! Sprint Pulse CLI - daily sprint progress snapshots.

use anyhow::Result;
use clap::{Parser, Subcommand};
use sprintpulse_progress::{log_outcome, run_from_env};
use sprintpulse_storage::DbConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sprint-pulse")]
#[command(about = "Record daily progress for every active sprint", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the progress job once (default)
    Run {
        /// Print the run report as JSON on stdout
        #[arg(long)]
        json: bool,
        /// Exit non-zero when the run fails
        #[arg(long)]
        strict: bool,
    },
    /// Resolve connection settings without connecting
    CheckConfig,
}

fn init_logging() {
    // stdout is reserved for --json output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run {
        json: false,
        strict: false,
    });

    match command {
        Commands::Run { json, strict } => {
            info!("Starting sprint progress run v{}", env!("CARGO_PKG_VERSION"));
            let result = run_from_env().await;
            log_outcome(&result);

            match result {
                Ok(report) if json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                Ok(_) => {}
                Err(e) if strict => return Err(e.into()),
                Err(_) => {}
            }
        }
        Commands::CheckConfig => {
            let config = DbConfig::from_env()?;
            info!("Connection settings resolved");
            println!("{}", config.redacted_url());
        }
    }

    Ok(())
}
