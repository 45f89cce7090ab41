//! swingtrim library
//!
//! Device-adaptive trimming and compression of recorded videos. Frames are
//! sampled from a decodable source, redrawn onto a fixed-size surface and
//! streamed into an encoder, with the capture strategy chosen per device and
//! a fallback chain that ends, at worst, with the original video.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use app::{
    AppContainer, CompressInteractor, CompressRequest, DefaultAppContainer, TrimInteractor,
    TrimRequest, UploadInteractor, UploadReceipt,
};
pub use domain::errors::DomainError;
pub use domain::model::{
    CaptureStrategy, CompressOutcome, DeviceProfile, OutputVideo, QualityLevel, SourceVideo,
    TrimOutcome, TrimRange, VideoBlob,
};
pub use engine::{CancelHandle, CancelToken, EngineConfig};
pub use error::{SwingTrimError, SwingTrimResult};
