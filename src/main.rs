//! lldb-harness - end-to-end tests for remote RenderScript debugging
//!
//! Attaches a debugger to an app on an Android device, runs a scenario of
//! debugger commands and checks their output.

use std::path::PathBuf;

use clap::Parser;
use commands::Commands;
use lldb_harness::common::{config::Config, logging};
use lldb_harness::{cli, commands};

#[derive(Parser)]
#[command(name = "lldb-harness", about = "End-to-end remote debugger test harness")]
#[command(version, long_about = None)]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write detailed logs to a file (default: harness.log in the
    /// platform data dir)
    #[arg(long, global = true, num_args = 0..=1)]
    log_file: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .clone()
        .map(|path| path.or_else(logging::default_log_path));
    match log_file {
        Some(Some(path)) => {
            if let Some(path) = logging::init_file(&path) {
                tracing::info!(path = %path.display(), "Writing log file");
            }
        }
        Some(None) => {
            logging::init_cli();
            tracing::warn!("No data directory for the default log file");
        }
        None => logging::init_cli(),
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let result = match config {
        Ok(config) => cli::dispatch(cli.command, &config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
