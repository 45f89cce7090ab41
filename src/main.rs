//! swingtrim CLI
//!
//! Trims, compresses and uploads swing videos using the device-adaptive
//! capture pipeline.
//!
//! # Usage
//!
//! ```bash
//! swingtrim trim --input swing.y4m --start 2 --end 9 --upload
//! swingtrim compress --input swing.y4m --quality low
//! swingtrim --user-agent "Mozilla/5.0 (iPhone)" probe
//! swingtrim status --file-name swing_20240309T140507000Z.webm
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use swingtrim::adapters::init_logging;
use swingtrim::cli::{commands, Cli, Commands};
use swingtrim::config_initialization::initialize_configuration;
use swingtrim::ports::LogLevel;
use swingtrim::{CancelToken, DefaultAppContainer, SwingTrimError};

/// Main entry point for the swingtrim CLI application
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("Error: {:#}", err);
            let code = err
                .downcast_ref::<SwingTrimError>()
                .map(SwingTrimError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code.clamp(1, 255) as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = initialize_configuration(&cli)
        .map_err(SwingTrimError::from)
        .context("Failed to load configuration")?;

    let level = LogLevel::parse(&config.logging.level).map_err(SwingTrimError::from)?;
    init_logging(level, config.logging.json).map_err(SwingTrimError::from)?;
    info!("Starting swingtrim");

    let container = DefaultAppContainer::new(&config).map_err(SwingTrimError::from)?;

    let (handle, cancel) = CancelToken::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            handle.cancel();
        }
    });

    match cli.command {
        Commands::Trim(args) => commands::trim(&container, args, &cancel).await?,
        Commands::Compress(args) => commands::compress(&container, args, &cancel).await?,
        Commands::Probe(args) => commands::probe(&container, args).await?,
        Commands::Upload(args) => commands::upload(&container, args).await?,
        Commands::Status(args) => commands::status(&container, args).await?,
    }

    info!("swingtrim completed successfully");
    Ok(())
}
