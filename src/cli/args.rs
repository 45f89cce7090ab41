//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the trim command
#[derive(Args, Debug)]
pub struct TrimArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Start time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub start: String,

    /// End time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub end: String,

    /// Output file path (default: <input>_trimmed.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Quality level (very-low, low, medium, high, original)
    #[arg(short, long)]
    pub quality: Option<String>,

    /// Upload the result to the analysis backend
    #[arg(long)]
    pub upload: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the compress command
#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file path (default: <input>_compressed.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Quality level; chosen from the network when omitted
    #[arg(short, long)]
    pub quality: Option<String>,

    /// Longest span to keep, in seconds
    #[arg(long)]
    pub max_duration: Option<f64>,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the upload command
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Trimmed video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Start of the trimmed range in the original video
    #[arg(short, long)]
    pub start: String,

    /// End of the trimmed range in the original video
    #[arg(short, long)]
    pub end: String,

    /// Print the receipt as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// File name returned by a previous upload
    #[arg(short, long)]
    pub file_name: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
