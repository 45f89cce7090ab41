//! Core capture engine: probing, metadata, sampling, re-encoding and the
//! capture strategies built on top of them.

use serde::{Deserialize, Serialize};

use crate::domain::model::QualityLevel;
use crate::domain::rules::{DeadlinePolicy, MetadataPolicy, MIN_OUTPUT_BYTES};

pub mod cancel;
pub mod capability;
pub mod metadata;
pub mod reencoder;
pub mod sampler;
pub mod signal;
pub mod strategy;
pub mod surface;

pub use cancel::{CancelHandle, CancelToken};
pub use capability::CapabilityProber;
pub use metadata::{LoadedVideo, MetadataLoader};
pub use reencoder::ReEncoder;
pub use sampler::{FrameSampler, SampleTimestamps, SeekOutcome};
pub use signal::{race_signal, with_cancel, SignalOutcome};
pub use strategy::{run_strategy, CaptureContext, CaptureEnv, CaptureReport};
pub use surface::DrawingSurface;

/// Still budget for discrete capture: 15 s of 720p at 30 fps in 4:2:0
pub const DEFAULT_MAX_STILL_BYTES: usize = 640 * 1024 * 1024;

/// Capture engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Encoder formats tried in priority order
    pub mime_candidates: Vec<String>,
    /// Format used when no candidate is supported
    pub fallback_mime_type: String,
    /// Metadata wait policy
    pub metadata: MetadataPolicy,
    /// Global deadline policy
    pub deadline: DeadlinePolicy,
    /// Seek wait for the standard strategy (ms)
    pub seek_timeout_standard_ms: u64,
    /// Seek wait for the discrete-frame strategy (ms)
    pub seek_timeout_discrete_ms: u64,
    /// Presented-frame wait for continuous playback (ms)
    pub frame_wait_ms: u64,
    /// Consecutive frame waits without progress before playback is abandoned
    pub max_stalled_frames: u32,
    /// Wait for the encoder's final stop signal (ms)
    pub encoder_stop_timeout_ms: u64,
    /// Bytes of stills the discrete-frame capture may hold before giving up
    pub max_still_bytes: usize,
    /// Outputs below this size are rejected
    pub min_output_bytes: usize,
    /// Quality used for trims
    pub trim_quality: QualityLevel,
    /// Longest span the compressor re-encodes, seconds
    pub compress_max_duration_secs: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mime_candidates: capability::DEFAULT_MIME_CANDIDATES
                .iter()
                .map(|m| m.to_string())
                .collect(),
            fallback_mime_type: capability::FALLBACK_MIME_TYPE.to_string(),
            metadata: MetadataPolicy::default(),
            deadline: DeadlinePolicy::default(),
            seek_timeout_standard_ms: 500,
            seek_timeout_discrete_ms: 1000,
            frame_wait_ms: 200,
            max_stalled_frames: 10,
            encoder_stop_timeout_ms: 5000,
            max_still_bytes: DEFAULT_MAX_STILL_BYTES,
            min_output_bytes: MIN_OUTPUT_BYTES,
            trim_quality: QualityLevel::High,
            compress_max_duration_secs: 15.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), crate::domain::errors::DomainError> {
        use crate::domain::errors::DomainError;

        if self.fallback_mime_type.trim().is_empty() {
            return Err(DomainError::Config(
                "fallback_mime_type cannot be empty".to_string(),
            ));
        }
        if self.compress_max_duration_secs <= 0.0 || !self.compress_max_duration_secs.is_finite() {
            return Err(DomainError::Config(
                "compress_max_duration_secs must be positive".to_string(),
            ));
        }
        if self.max_still_bytes == 0 {
            return Err(DomainError::Config(
                "max_still_bytes must be positive".to_string(),
            ));
        }
        if self.max_stalled_frames == 0 {
            return Err(DomainError::Config(
                "max_stalled_frames must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
