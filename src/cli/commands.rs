//! Command implementations

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::app::{AppContainer, CompressRequest, TrimRequest, UploadReceipt};
use crate::cli::args::{CompressArgs, ProbeArgs, StatusArgs, TrimArgs, UploadArgs};
use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::engine::CancelToken;
use crate::error::{SwingTrimError, SwingTrimResult};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrimReport {
    output: String,
    mime_type: String,
    bytes: usize,
    start_time: f64,
    end_time: f64,
    duration: f64,
    strategy: Option<CaptureStrategy>,
    fell_back_to_original: bool,
    warnings: Vec<String>,
    processing_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    upload: Option<UploadReceipt>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompressReport {
    output: String,
    mime_type: String,
    source_bytes: usize,
    bytes: usize,
    ratio: f64,
    quality: QualityLevel,
    compressed: bool,
    warnings: Vec<String>,
    processing_ms: u128,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProbeReport<'a> {
    profile: &'a DeviceProfile,
    strategy: CaptureStrategy,
    network: NetworkConditions,
}

/// Execute the trim command
pub async fn trim(
    container: &dyn AppContainer,
    args: TrimArgs,
    cancel: &CancelToken,
) -> SwingTrimResult<()> {
    let start = parse_time(&args.start)?;
    let end = parse_time(&args.end)?;
    let quality = parse_quality(args.quality.as_deref())?;
    let source = read_video(&args.input).await?;
    info!(input = %args.input.display(), start, end, "Starting trim");

    let outcome = container
        .trim_interactor()
        .trim(
            TrimRequest {
                source,
                start,
                end,
                quality,
            },
            cancel,
        )
        .await?;

    let output = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input, "trimmed", &outcome.video));
    write_video(&output, &outcome.video).await?;

    let upload = if args.upload {
        Some(
            container
                .upload_interactor()
                .upload(&outcome.video, outcome.range)
                .await?,
        )
    } else {
        None
    };

    let report = TrimReport {
        output: output.display().to_string(),
        mime_type: outcome.video.mime_type().to_string(),
        bytes: outcome.video.len(),
        start_time: outcome.range.start,
        end_time: outcome.range.end,
        duration: outcome.range.span(),
        strategy: outcome.strategy_used,
        fell_back_to_original: outcome.fell_back_to_original,
        warnings: outcome.warnings.clone(),
        processing_ms: outcome.processing_time.as_millis(),
        upload,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Trimmed {} -> {}", args.input.display(), report.output);
        println!("  Range:    {}", outcome.range);
        match report.strategy {
            Some(strategy) => println!("  Strategy: {}", strategy),
            None => println!("  Strategy: none"),
        }
        println!("  Size:     {} bytes ({})", report.bytes, report.mime_type);
        if report.fell_back_to_original {
            println!("  Note:     every strategy failed, original video kept");
        }
        for warning in &report.warnings {
            println!("  Warning:  {}", warning);
        }
        if let Some(receipt) = &report.upload {
            println!("  Uploaded: {} ({})", receipt.public_url, receipt.file_name);
        }
    }
    Ok(())
}

/// Execute the compress command
pub async fn compress(
    container: &dyn AppContainer,
    args: CompressArgs,
    cancel: &CancelToken,
) -> SwingTrimResult<()> {
    let quality = parse_quality(args.quality.as_deref())?;
    if let Some(max_duration) = args.max_duration {
        if !max_duration.is_finite() || max_duration <= 0.0 {
            return Err(DomainError::BadArgs(format!(
                "max duration must be positive: {}",
                max_duration
            ))
            .into());
        }
    }
    let source = read_video(&args.input).await?;
    info!(input = %args.input.display(), "Starting compression");

    let outcome = container
        .compress_interactor()
        .compress(
            CompressRequest {
                source: source.clone(),
                quality,
                max_duration: args.max_duration,
            },
            cancel,
        )
        .await?;

    let output = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input, "compressed", &outcome.video));
    write_video(&output, &outcome.video).await?;

    let report = CompressReport {
        output: output.display().to_string(),
        mime_type: outcome.video.mime_type().to_string(),
        source_bytes: source.len(),
        bytes: outcome.video.len(),
        ratio: outcome.ratio(&source),
        quality: outcome.quality,
        compressed: outcome.compressed,
        warnings: outcome.warnings.clone(),
        processing_ms: outcome.processing_time.as_millis(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Compressed {} -> {}", args.input.display(), report.output);
        println!("  Quality: {}", report.quality);
        println!(
            "  Size:    {} -> {} bytes ({:.0}%)",
            report.source_bytes,
            report.bytes,
            report.ratio * 100.0
        );
        if !report.compressed {
            println!("  Note:    original video kept");
        }
        for warning in &report.warnings {
            println!("  Warning: {}", warning);
        }
    }
    Ok(())
}

/// Execute the probe command
pub async fn probe(container: &dyn AppContainer, args: ProbeArgs) -> SwingTrimResult<()> {
    let profile = container.profile();
    let report = ProbeReport {
        profile,
        strategy: crate::domain::rules::StrategySelector::select(profile),
        network: container.compress_interactor().network_conditions(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Device profile:");
        println!("  Mobile:   {}", profile.is_mobile);
        println!("  iOS:      {}", profile.is_ios);
        println!("  Android:  {}", profile.is_android);
        println!("  Encoder:  {}", profile.preferred_mime_type);
        println!("  Strategy: {}", report.strategy);
        println!("Network:");
        println!(
            "  Type:     {}",
            report.network.effective_type.as_deref().unwrap_or("unknown")
        );
        match report.network.downlink {
            Some(downlink) => println!("  Downlink: {:.1} Mbit/s", downlink),
            None => println!("  Downlink: unknown"),
        }
        println!("  Quality:  {}", report.network.quality_recommendation);
    }
    Ok(())
}

/// Execute the upload command
pub async fn upload(container: &dyn AppContainer, args: UploadArgs) -> SwingTrimResult<()> {
    let start = parse_time(&args.start)?;
    let end = parse_time(&args.end)?;
    if end <= start {
        return Err(DomainError::BadArgs(format!(
            "end ({}) must be after start ({})",
            args.end, args.start
        ))
        .into());
    }
    let video = read_video(&args.input).await?;

    let receipt = container
        .upload_interactor()
        .upload(&video, TrimRange { start, end })
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    } else {
        println!("Uploaded {}", args.input.display());
        println!("  File name:  {}", receipt.file_name);
        println!("  Public URL: {}", receipt.public_url);
    }
    Ok(())
}

/// Execute the status command
pub async fn status(container: &dyn AppContainer, args: StatusArgs) -> SwingTrimResult<()> {
    let status = container.upload_interactor().status(&args.file_name).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else if let Some(error) = &status.error {
        warn!(file_name = %args.file_name, %error, "Backend reported a processing error");
        println!("{}: failed ({})", args.file_name, error);
    } else if status.exists {
        println!(
            "{}: ready {}",
            args.file_name,
            status.public_url.as_deref().unwrap_or("")
        );
    } else {
        println!("{}: processing", args.file_name);
    }
    Ok(())
}

fn parse_time(value: &str) -> SwingTrimResult<f64> {
    parse_seconds(value).map_err(|_| SwingTrimError::InvalidTimeFormat {
        time: value.to_string(),
    })
}

fn parse_quality(value: Option<&str>) -> SwingTrimResult<Option<QualityLevel>> {
    value
        .map(|q| q.parse::<QualityLevel>())
        .transpose()
        .map_err(SwingTrimError::from)
}

/// Read a video file, taking its MIME type from the extension
pub async fn read_video(path: &Path) -> SwingTrimResult<SourceVideo> {
    if !path.exists() {
        return Err(SwingTrimError::InputFileNotFound {
            path: path.display().to_string(),
        });
    }
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let mime_type = mime_for_extension(extension).ok_or_else(|| {
        DomainError::BadArgs(format!("Unrecognized video extension: {}", path.display()))
    })?;
    let bytes = tokio::fs::read(path).await?;
    Ok(VideoBlob::new(bytes, mime_type))
}

async fn write_video(path: &Path, video: &OutputVideo) -> SwingTrimResult<()> {
    tokio::fs::write(path, video.bytes())
        .await
        .map_err(|e| SwingTrimError::OutputError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    info!(output = %path.display(), bytes = video.len(), "Wrote video");
    Ok(())
}

/// `<stem>_<suffix>.<ext>` next to the input, extension following the output MIME
pub fn default_output_path(input: &Path, suffix: &str, video: &OutputVideo) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    input.with_file_name(format!("{}_{}.{}", stem, suffix, video.extension()))
}
