// Ports - Interface definitions (contracts) for every platform collaborator

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Temporary handle through which an element reads a source.
/// Must be revoked exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Runtime inspection surface read by the capability prober
pub trait PlatformPort: Send + Sync {
    /// Platform identifier string
    fn user_agent(&self) -> String;

    /// Number of simultaneous touch points the device supports
    fn max_touch_points(&self) -> u32;

    /// Whether the streaming encoder accepts this MIME type
    fn can_encode(&self, mime_type: &str) -> bool;
}

/// Optional network-information capability
pub trait NetworkPort: Send + Sync {
    fn connection(&self) -> Option<ConnectionInfo>;
}

/// Decodable element bound to one object URL.
///
/// Only one frame is exposed at a time: the one at `current_time()`.
#[async_trait]
pub trait VideoElement: Send {
    /// Suspend until metadata is available or decoding fails
    async fn loaded_metadata(&mut self) -> Result<VideoMetadata, DomainError>;

    /// Whatever metadata the element reports right now
    fn metadata_snapshot(&self) -> Option<VideoMetadata>;

    /// Start seeking to `seconds`
    fn set_current_time(&mut self, seconds: f64);

    /// Suspend until the pending seek completes
    async fn seeked(&mut self);

    fn current_time(&self) -> f64;

    /// Frame currently displayed, as RGBA pixels
    fn current_frame(&self) -> Result<Frame, DomainError>;

    /// Start playback at `rate`
    async fn play(&mut self, rate: f64) -> Result<(), DomainError>;

    fn pause(&mut self);

    /// Suspend until a new frame is presented; yields its media time
    async fn next_frame(&mut self) -> f64;

    fn is_ended(&self) -> bool;
}

/// Options handed to the streaming encoder
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderOptions {
    /// Requested container/codec; `None` lets the platform choose
    pub mime_type: Option<String>,
    /// Requested bitrate; `None` lets the platform choose
    pub video_bits_per_second: Option<u32>,
    pub frame_rate: u32,
    pub width: u32,
    pub height: u32,
    /// Output length in seconds; captures placed past it are not encoded
    pub duration: Option<f64>,
}

impl EncoderOptions {
    /// Cap the output at `seconds`
    pub fn with_duration(self, seconds: f64) -> Self {
        Self {
            duration: Some(seconds),
            ..self
        }
    }

    /// Same stream, no format options
    pub fn platform_defaults(&self) -> Self {
        Self {
            mime_type: None,
            video_bits_per_second: None,
            ..self.clone()
        }
    }
}

/// Events drained from a running encoder
#[derive(Debug, Clone, PartialEq)]
pub enum EncoderEvent {
    /// An encoded fragment
    Data(Vec<u8>),
    /// Final signal; no data follows
    Stopped { mime_type: String },
    /// Encoder failed mid-stream
    Error(String),
}

/// Receiving half of an encoder's event stream
pub type EncoderEvents = mpsc::UnboundedReceiver<EncoderEvent>;

/// Running encoder bound to a live capture of a drawing surface
pub trait EncoderSession: Send {
    /// Hand the surface's current pixels to the capture stream.
    /// `pts` is the frame's position in the output, in seconds.
    fn capture(&mut self, frame: &Frame, pts: f64) -> Result<(), DomainError>;

    /// Request a stop; `EncoderEvent::Stopped` follows the last fragment
    fn stop(&mut self);
}

/// Port for decoding sources and encoding outputs
#[async_trait]
pub trait MediaPort: Send + Sync {
    fn create_object_url(&self, source: &SourceVideo) -> ObjectUrl;

    fn revoke_object_url(&self, url: &ObjectUrl);

    async fn open_element(&self, url: &ObjectUrl) -> Result<Box<dyn VideoElement>, DomainError>;

    async fn start_encoder(
        &self,
        options: &EncoderOptions,
    ) -> Result<(Box<dyn EncoderSession>, EncoderEvents), DomainError>;
}

/// Port for signed upload issuance and the binary PUT
#[async_trait]
pub trait UploadPort: Send + Sync {
    async fn request_upload_target(
        &self,
        filename: &str,
        content_type: &str,
        metadata: &serde_json::Value,
    ) -> Result<UploadTarget, DomainError>;

    async fn put(&self, upload_url: &str, video: &OutputVideo) -> Result<(), DomainError>;
}

/// Port for the processing-status check
#[async_trait]
pub trait StatusPort: Send + Sync {
    async fn check_status(&self, file_name: &str) -> Result<ProcessingStatus, DomainError>;
}

/// Operation an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Trim,
    Compress,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Trim => f.write_str("trim"),
            Operation::Compress => f.write_str("compress"),
        }
    }
}

/// Structured pipeline event delivered to an observer
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StateChanged {
        operation: Operation,
        state: TrimState,
    },
    StrategySelected {
        operation: Operation,
        strategy: CaptureStrategy,
    },
    FrameCaptured {
        index: usize,
        timestamp: f64,
    },
    SeekTimedOut {
        timestamp: f64,
    },
    EncoderRetry {
        reason: String,
    },
    DeadlineReached {
        strategy: CaptureStrategy,
        seconds: f64,
    },
    FallbackToStrategy {
        from: CaptureStrategy,
        to: CaptureStrategy,
        reason: String,
    },
    FallbackToOriginal {
        operation: Operation,
        reason: String,
    },
    Completed {
        operation: Operation,
        bytes: usize,
        elapsed_ms: u128,
    },
}

impl PipelineEvent {
    pub fn level(&self) -> LogLevel {
        match self {
            PipelineEvent::FrameCaptured { .. } => LogLevel::Trace,
            PipelineEvent::StateChanged { .. } | PipelineEvent::SeekTimedOut { .. } => {
                LogLevel::Debug
            }
            PipelineEvent::StrategySelected { .. } | PipelineEvent::Completed { .. } => {
                LogLevel::Info
            }
            PipelineEvent::EncoderRetry { .. }
            | PipelineEvent::DeadlineReached { .. }
            | PipelineEvent::FallbackToStrategy { .. }
            | PipelineEvent::FallbackToOriginal { .. } => LogLevel::Warn,
        }
    }
}

/// Port for logging and observability, injected into the orchestrators
pub trait ObserverPort: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Observer that drops every event
pub struct NullObserver;

impl ObserverPort for NullObserver {
    fn on_event(&self, _event: &PipelineEvent) {}
}

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse log level from string
    pub fn parse(level_str: &str) -> Result<Self, DomainError> {
        match level_str.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid log level: {}. Valid levels: trace, debug, info, warn, error",
                level_str
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
