//! Stumbler CLI - Command-line interface
//!
//! Uploads collected reports to a geosubmit service and queries position
//! estimates from the geolocate endpoint.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stumbler::config::{config_file_path, ConfigFile};
use stumbler::logging::init_logging;

use commands::config::ConfigCommands;
use commands::submit::SubmitArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "stumbler")]
#[command(about = "Submit radio-environment reports to a geosubmit service", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.stumbler/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload pending reports from a JSON file
    Submit {
        /// JSON array of reports; uploaded reports are marked in place
        file: PathBuf,

        /// Encode the batches and report their size without sending
        #[arg(long)]
        dry_run: bool,

        /// Reports per request (overrides submission.batch_size)
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Estimate a position from a geolocate request JSON file
    Locate {
        /// Geolocate request (cellTowers, wifiAccessPoints, bluetoothBeacons)
        file: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { config, command } = cli;
    let config_path = config.unwrap_or_else(config_file_path);

    let command = match command {
        Commands::Config { command } => return commands::config::run(command, &config_path),
        other => other,
    };

    let config = ConfigFile::load_from(&config_path)?;
    let _logging_guard =
        init_logging(&config.logging.file, &config.logging.filter).map_err(CliError::LoggingInit)?;
    tracing::debug!(config = %config_path.display(), "Configuration loaded");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(async {
        match command {
            Commands::Submit {
                file,
                dry_run,
                batch_size,
            } => {
                let args = SubmitArgs {
                    file,
                    dry_run,
                    batch_size,
                };
                commands::submit::run(args, &config).await
            }
            Commands::Locate { file } => commands::locate::run(file, &config).await,
            Commands::Config { .. } => Ok(()),
        }
    })
}
