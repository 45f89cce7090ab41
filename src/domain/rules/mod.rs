// Domain rules - Pure policies for strategy, quality, deadlines and output validation

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::model::*;

/// Picks the capture strategy for a device
pub struct StrategySelector;

impl StrategySelector {
    /// iOS gets discrete-frame capture, other mobile devices continuous
    /// playback, desktops the standard seek-and-draw loop.
    pub fn select(profile: &DeviceProfile) -> CaptureStrategy {
        if profile.is_ios {
            CaptureStrategy::DiscreteFrame
        } else if profile.is_mobile {
            CaptureStrategy::ContinuousPlayback
        } else {
            CaptureStrategy::Standard
        }
    }

    /// Strategy to retry with after `failed` fails, if any
    pub fn fallback_for(failed: CaptureStrategy) -> Option<CaptureStrategy> {
        match failed {
            CaptureStrategy::DiscreteFrame => None,
            _ => Some(CaptureStrategy::DiscreteFrame),
        }
    }
}

/// Downlink (Mbps) below which a 3g connection is treated as low quality
pub const LOW_DOWNLINK_MBPS: f64 = 1.0;

/// Downlink (Mbps) at or above which a 4g connection earns high quality
pub const HIGH_DOWNLINK_MBPS: f64 = 5.0;

/// Map the platform's network information to a quality recommendation
pub fn detect_network_conditions(connection: Option<&ConnectionInfo>) -> NetworkConditions {
    let Some(connection) = connection else {
        return NetworkConditions {
            effective_type: None,
            downlink: None,
            quality_recommendation: QualityLevel::Medium,
        };
    };

    let downlink = connection.downlink.filter(|d| d.is_finite() && *d >= 0.0);
    let quality_recommendation = match connection.effective_type.to_lowercase().as_str() {
        "slow-2g" | "2g" => QualityLevel::VeryLow,
        "3g" if downlink.is_some_and(|d| d < LOW_DOWNLINK_MBPS) => QualityLevel::Low,
        "3g" => QualityLevel::Medium,
        "4g" if downlink.is_some_and(|d| d >= HIGH_DOWNLINK_MBPS) => QualityLevel::High,
        _ => QualityLevel::Medium,
    };

    NetworkConditions {
        effective_type: Some(connection.effective_type.clone()),
        downlink,
        quality_recommendation,
    }
}

/// Wall-clock budget for one capture attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlinePolicy {
    /// Minimum deadline on mobile devices, seconds
    pub mobile_floor_secs: f64,
    /// Minimum deadline on desktops, seconds
    pub desktop_floor_secs: f64,
    /// Multiplier applied to the expected capture duration
    pub duration_multiplier: f64,
    /// Fixed margin added to the scaled duration, seconds
    pub margin_secs: f64,
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self {
            mobile_floor_secs: 45.0,
            desktop_floor_secs: 120.0,
            duration_multiplier: 1.5,
            margin_secs: 10.0,
        }
    }
}

impl DeadlinePolicy {
    pub fn deadline(&self, profile: &DeviceProfile, expected_secs: f64) -> Duration {
        let floor = if profile.is_mobile {
            self.mobile_floor_secs
        } else {
            self.desktop_floor_secs
        };
        let scaled = self.duration_multiplier * expected_secs.max(0.0) + self.margin_secs;
        Duration::from_secs_f64(floor.max(scaled).max(0.0))
    }
}

/// Metadata wait and duration estimate policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataPolicy {
    pub desktop_timeout_ms: u64,
    pub mobile_timeout_ms: u64,
    /// Sources larger than this get `large_source_extra_ms` more
    pub large_source_bytes: usize,
    pub large_source_extra_ms: u64,
}

impl Default for MetadataPolicy {
    fn default() -> Self {
        Self {
            desktop_timeout_ms: 3000,
            mobile_timeout_ms: 5000,
            large_source_bytes: 50 * 1024 * 1024,
            large_source_extra_ms: 2000,
        }
    }
}

impl MetadataPolicy {
    pub fn timeout(&self, profile: &DeviceProfile, source: &SourceVideo) -> Duration {
        let mut ms = if profile.is_mobile {
            self.mobile_timeout_ms
        } else {
            self.desktop_timeout_ms
        };
        if source.len() > self.large_source_bytes {
            ms += self.large_source_extra_ms;
        }
        Duration::from_millis(ms)
    }

    /// Replace a missing or broken duration with a size-based guess:
    /// roughly one second per MiB, never below one second.
    pub fn sanitize_duration(duration: f64, source: &SourceVideo) -> f64 {
        if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            source.size_mib().max(1.0)
        }
    }
}

/// Business rules for output validation
pub struct OutputValidator;

/// Outputs smaller than this are treated as empty
pub const MIN_OUTPUT_BYTES: usize = 1024;

impl OutputValidator {
    pub fn is_acceptable(output: &OutputVideo, min_bytes: usize) -> bool {
        output.len() >= min_bytes
    }
}

#[cfg(test)]
mod tests;
