//! CLI module for swingtrim
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// swingtrim - device-adaptive swing video trimming
///
/// Trims and compresses recorded videos by sampling frames and re-encoding
/// them, then hands the result to the analysis backend.
#[derive(Parser, Debug)]
#[command(name = "swingtrim")]
#[command(about = "Trim, compress and upload swing videos")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./swingtrim.toml when present)
    #[arg(long, global = true, env = "SWINGTRIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Platform identifier used for device classification
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// Simultaneous touch points reported by the device
    #[arg(long, global = true)]
    pub touch_points: Option<u32>,

    /// Reported connection class (slow-2g, 2g, 3g, 4g)
    #[arg(long, global = true)]
    pub effective_type: Option<String>,

    /// Reported downlink in Mbit/s
    #[arg(long, global = true)]
    pub downlink: Option<f64>,

    /// Analysis backend base URL
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cut a segment out of a video by re-encoding sampled frames
    Trim(args::TrimArgs),
    /// Shrink a video to a quality suited to the network
    Compress(args::CompressArgs),
    /// Show the device profile and network conditions
    Probe(args::ProbeArgs),
    /// Upload a trimmed video to the analysis backend
    Upload(args::UploadArgs),
    /// Check whether the backend finished processing an upload
    Status(args::StatusArgs),
}
