// Domain models - Core types and data structures

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Shortest span a trim may produce, in seconds
pub const MIN_TRIM_SPAN: f64 = 0.5;

/// Opaque binary video asset: bytes plus MIME type.
///
/// Cloning shares the underlying bytes, so handing the original back on
/// fallback never copies it.
#[derive(Clone, PartialEq)]
pub struct VideoBlob {
    bytes: Arc<[u8]>,
    mime_type: String,
}

/// Video supplied by the caller
pub type SourceVideo = VideoBlob;

/// Video produced by a trim or compression
pub type OutputVideo = VideoBlob;

impl VideoBlob {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when both blobs share the same allocation
    pub fn same_allocation(&self, other: &VideoBlob) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }

    /// Size in mebibytes, used by the duration estimate
    pub fn size_mib(&self) -> f64 {
        self.bytes.len() as f64 / (1024.0 * 1024.0)
    }

    /// File extension matching the MIME container
    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }
}

impl fmt::Debug for VideoBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoBlob")
            .field("len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Map a MIME type (with optional codec parameters) to a file extension
pub fn extension_for_mime(mime: &str) -> &'static str {
    let container = mime.split(';').next().unwrap_or("").trim();
    match container {
        "video/webm" => "webm",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/x-yuv4mpeg" => "y4m",
        _ => "bin",
    }
}

/// MIME type for a file extension, case-insensitive
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "webm" => Some("video/webm"),
        "mp4" | "m4v" => Some("video/mp4"),
        "mov" => Some("video/quicktime"),
        "y4m" => Some("video/x-yuv4mpeg"),
        _ => None,
    }
}

/// Metadata reported by a decodable element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

/// Sub-range of a source timeline, in seconds.
///
/// Always satisfies `0 <= start < end <= duration` for the duration it was
/// clamped against, with `end - start >= MIN_TRIM_SPAN` whenever the source
/// is long enough.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

impl TrimRange {
    /// Clamp a requested range against a source duration
    pub fn clamped(start: f64, end: f64, duration: f64) -> Self {
        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            MIN_TRIM_SPAN
        };

        let mut start = if start.is_finite() { start.clamp(0.0, duration) } else { 0.0 };
        let mut end = if end.is_finite() { end.clamp(0.0, duration) } else { duration };
        if end < start {
            std::mem::swap(&mut start, &mut end);
        }

        if end - start < MIN_TRIM_SPAN {
            end = start + MIN_TRIM_SPAN;
            if end > duration {
                end = duration;
                start = (end - MIN_TRIM_SPAN).max(0.0);
            }
        }

        Self { start, end }
    }

    /// Full source timeline capped at `max_duration`
    pub fn leading(duration: f64, max_duration: f64) -> Self {
        Self::clamped(0.0, duration.min(max_duration), duration)
    }

    pub fn span(&self) -> f64 {
        self.end - self.start
    }
}

impl fmt::Display for TrimRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", format_seconds(self.start), format_seconds(self.end))
    }
}

/// Named quality bundles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityLevel {
    VeryLow,
    Low,
    Medium,
    High,
    Original,
}

impl QualityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLevel::VeryLow => "very-low",
            QualityLevel::Low => "low",
            QualityLevel::Medium => "medium",
            QualityLevel::High => "high",
            QualityLevel::Original => "original",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "very-low" | "very_low" | "verylow" => Ok(QualityLevel::VeryLow),
            "low" => Ok(QualityLevel::Low),
            "medium" => Ok(QualityLevel::Medium),
            "high" => Ok(QualityLevel::High),
            "original" => Ok(QualityLevel::Original),
            other => Err(DomainError::BadArgs(format!(
                "Invalid quality: {}. Valid values: very-low, low, medium, high, original",
                other
            ))),
        }
    }
}

/// Target resolution, bitrate and frame rate for one quality level.
///
/// A zero target dimension means "keep the source dimension".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityPreset {
    pub level: QualityLevel,
    pub target_width: u32,
    pub target_height: u32,
    pub bitrate: u32,
    pub frame_rate: u32,
}

impl QualityPreset {
    pub fn for_level(level: QualityLevel) -> Self {
        let (target_width, target_height, bitrate, frame_rate) = match level {
            QualityLevel::VeryLow => (426, 240, 250_000, 15),
            QualityLevel::Low => (640, 360, 500_000, 24),
            QualityLevel::Medium => (854, 480, 1_000_000, 30),
            QualityLevel::High => (1280, 720, 2_500_000, 30),
            QualityLevel::Original => (0, 0, 0, 0),
        };
        Self {
            level,
            target_width,
            target_height,
            bitrate,
            frame_rate,
        }
    }

    /// Preset used when trimming; a trim always re-encodes, so `original`
    /// keeps source dimensions at the high bitrate.
    pub fn for_trim(level: QualityLevel) -> Self {
        match level {
            QualityLevel::Original => {
                let high = Self::for_level(QualityLevel::High);
                Self {
                    level,
                    target_width: 0,
                    target_height: 0,
                    ..high
                }
            }
            other => Self::for_level(other),
        }
    }

    /// `original` means no re-encoding at all
    pub fn is_passthrough(&self) -> bool {
        self.level == QualityLevel::Original && self.bitrate == 0
    }

    /// Fit source dimensions inside the preset box without upscaling.
    /// Results are even, as most encoders require.
    pub fn target_dimensions(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        let source_width = source_width.max(2);
        let source_height = source_height.max(2);
        if self.target_width == 0 || self.target_height == 0 {
            return (even(source_width), even(source_height));
        }

        let scale = (self.target_width as f64 / source_width as f64)
            .min(self.target_height as f64 / source_height as f64);
        if scale >= 1.0 {
            return (even(source_width), even(source_height));
        }

        let scaled = |side: u32, bound: u32| {
            let rounded = (side as f64 * scale / 2.0).round() as u32 * 2;
            rounded.clamp(2, bound.max(2))
        };
        (
            scaled(source_width, self.target_width),
            scaled(source_height, self.target_height),
        )
    }
}

fn even(value: u32) -> u32 {
    (value.max(2)) & !1
}

/// Resolved classification of the runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    pub is_mobile: bool,
    #[serde(rename = "isIOS")]
    pub is_ios: bool,
    pub is_android: bool,
    pub preferred_mime_type: String,
}

/// Capture strategies the trim orchestrator dispatches between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureStrategy {
    /// Seek and draw each sample while the encoder records (desktop)
    Standard,
    /// Capture stills first, then re-assemble them (iOS, universal fallback)
    DiscreteFrame,
    /// Play the element and grab presented frames (Android and other mobile)
    ContinuousPlayback,
}

impl fmt::Display for CaptureStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureStrategy::Standard => "standard",
            CaptureStrategy::DiscreteFrame => "discrete-frame",
            CaptureStrategy::ContinuousPlayback => "continuous-playback",
        };
        f.write_str(name)
    }
}

/// Trim orchestrator states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrimState {
    Idle,
    MetadataLoading,
    StrategySelected,
    Sampling,
    Encoding,
    Finalizing,
    Done,
    Failed,
}

/// RGBA pixel buffer for one decoded frame
#[derive(Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, DomainError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(DomainError::Decode(format!(
                "Frame {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Frame filled with one RGBA colour
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
            self.pixels[offset + 3],
        ]
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({}x{})", self.width, self.height)
    }
}

/// Planar 8-bit 4:2:0 picture: the Y plane, then Cb, then Cr.
///
/// Holds a frame in 1.5 bytes per pixel instead of RGBA's 4.
#[derive(Clone, PartialEq, Eq)]
pub struct Yuv420Frame {
    pub width: u32,
    pub height: u32,
    planes: Vec<u8>,
}

impl Yuv420Frame {
    /// Convert with BT.601 full-range coefficients; chroma is averaged over
    /// each 2x2 block
    pub fn from_rgba(frame: &Frame) -> Self {
        let (w, h) = (frame.width as usize, frame.height as usize);
        let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
        let mut planes = Vec::with_capacity(w * h + 2 * cw * ch);

        let yuv: Vec<[u8; 3]> = frame
            .pixels
            .chunks_exact(4)
            .map(|p| rgb_to_yuv(p[0], p[1], p[2]))
            .collect();
        planes.extend(yuv.iter().map(|p| p[0]));

        for plane in 1..=2 {
            for cy in 0..ch {
                for cx in 0..cw {
                    let mut sum = 0u32;
                    let mut count = 0u32;
                    for y in (cy * 2)..(cy * 2 + 2).min(h) {
                        for x in (cx * 2)..(cx * 2 + 2).min(w) {
                            sum += yuv[y * w + x][plane] as u32;
                            count += 1;
                        }
                    }
                    planes.push(((sum + count / 2) / count.max(1)) as u8);
                }
            }
        }

        Self {
            width: frame.width,
            height: frame.height,
            planes,
        }
    }

    pub fn to_rgba(&self) -> Frame {
        let (w, h) = (self.width as usize, self.height as usize);
        let cw = w.div_ceil(2);
        let chroma_size = cw * h.div_ceil(2);
        let (luma, chroma) = self.planes.split_at(w * h);
        let (cb, cr) = chroma.split_at(chroma_size);

        let mut pixels = Vec::with_capacity(w * h * 4);
        for y in 0..h {
            for x in 0..w {
                let index = (y / 2) * cw + x / 2;
                let [r, g, b] = yuv_to_rgb(luma[y * w + x], cb[index], cr[index]);
                pixels.extend_from_slice(&[r, g, b, 255]);
            }
        }
        Frame {
            width: self.width,
            height: self.height,
            pixels,
        }
    }

    pub fn into_planes(self) -> Vec<u8> {
        self.planes
    }

    /// Bytes held
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }
}

impl fmt::Debug for Yuv420Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Yuv420Frame({}x{})", self.width, self.height)
    }
}

fn clamp_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as f64;
    let u = u as f64 - 128.0;
    let v = v as f64 - 128.0;
    [
        clamp_u8(y + 1.402 * v),
        clamp_u8(y - 0.344_136 * u - 0.714_136 * v),
        clamp_u8(y + 1.772 * u),
    ]
}

pub fn rgb_to_yuv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    [
        clamp_u8(0.299 * r + 0.587 * g + 0.114 * b),
        clamp_u8(128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b),
        clamp_u8(128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b),
    ]
}

/// Network information exposed by the platform, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub effective_type: String,
    pub downlink: Option<f64>,
}

/// Network-aware quality recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConditions {
    pub effective_type: Option<String>,
    pub downlink: Option<f64>,
    pub quality_recommendation: QualityLevel,
}

/// Trim parameters handed to the caller for persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimParameters {
    pub video_url: String,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
}

/// Result of one trim run
#[derive(Debug, Clone)]
pub struct TrimOutcome {
    pub video: OutputVideo,
    pub range: TrimRange,
    pub source_duration: f64,
    pub strategy_used: Option<CaptureStrategy>,
    pub fell_back_to_original: bool,
    pub warnings: Vec<String>,
    pub processing_time: Duration,
}

impl TrimOutcome {
    /// Record describing this trim, pointing at `video_url`
    pub fn parameters(&self, video_url: impl Into<String>) -> TrimParameters {
        TrimParameters {
            video_url: video_url.into(),
            start_time: self.range.start,
            end_time: self.range.end,
            duration: self.range.span(),
        }
    }
}

/// Result of one compression run
#[derive(Debug, Clone)]
pub struct CompressOutcome {
    pub video: OutputVideo,
    pub quality: QualityLevel,
    pub compressed: bool,
    pub warnings: Vec<String>,
    pub processing_time: Duration,
}

impl CompressOutcome {
    /// Output size relative to the source (1.0 when passed through)
    pub fn ratio(&self, source: &SourceVideo) -> f64 {
        if source.is_empty() {
            return 1.0;
        }
        self.video.len() as f64 / source.len() as f64
    }
}

/// Signed upload destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTarget {
    pub upload_url: String,
    pub public_url: String,
}

/// Processing-status answer from the analysis backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStatus {
    pub exists: bool,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Parse a time string: plain seconds, `MM:SS.ms` or `HH:MM:SS.ms`
pub fn parse_seconds(time_str: &str) -> Result<f64, DomainError> {
    let trimmed = time_str.trim();

    if let Ok(seconds) = trimmed.parse::<f64>() {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(DomainError::BadArgs(format!(
                "Time must be a non-negative number: {}",
                trimmed
            )));
        }
        return Ok(seconds);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let invalid = || {
        DomainError::BadArgs(format!(
            "Invalid time format: {}. Supported formats: seconds (e.g., 12.5), MM:SS.ms, HH:MM:SS.ms",
            trimmed
        ))
    };

    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (
            0,
            m.parse::<u32>().map_err(|_| invalid())?,
            s.parse::<f64>().map_err(|_| invalid())?,
        ),
        [h, m, s] => {
            let minutes = m.parse::<u32>().map_err(|_| invalid())?;
            if minutes >= 60 {
                return Err(DomainError::BadArgs("Minutes must be less than 60".to_string()));
            }
            (
                h.parse::<u32>().map_err(|_| invalid())?,
                minutes,
                s.parse::<f64>().map_err(|_| invalid())?,
            )
        }
        _ => return Err(invalid()),
    };

    if !(0.0..60.0).contains(&seconds) {
        return Err(DomainError::BadArgs("Seconds must be less than 60".to_string()));
    }

    Ok(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

/// Format seconds as `M:SS.mmm` or `H:MM:SS.mmm`
pub fn format_seconds(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    if hours > 0 {
        format!("{}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
    } else {
        format!("{}:{:02}.{:03}", minutes, secs, millis)
    }
}
