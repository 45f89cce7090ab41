//! Frame sampler: the timestamp grid for a range and the per-frame seek.

use std::time::Duration;

use tracing::warn;

use crate::domain::errors::DomainError;
use crate::domain::model::TrimRange;
use crate::engine::cancel::CancelToken;
use crate::engine::signal::{race_signal, SignalOutcome};
use crate::ports::VideoElement;

/// Seeks never target the very last instant of a source
pub const SEEK_EPSILON: f64 = 0.001;

// Guards against `span * fps` landing a hair above an integer
const GRID_TOLERANCE: f64 = 1e-6;

/// Sample times for a range at a frame rate.
///
/// Values are computed by index, so long ranges do not drift. The grid
/// runs up to the first point at or past `end`, one frame over when `end`
/// is off-grid.
#[derive(Debug, Clone)]
pub struct SampleTimestamps {
    start: f64,
    frame_rate: f64,
    next: usize,
    count: usize,
}

impl SampleTimestamps {
    pub fn new(range: TrimRange, frame_rate: u32) -> Self {
        let frame_rate = frame_rate.max(1) as f64;
        let span = range.span().max(0.0);
        let count = (span * frame_rate - GRID_TOLERANCE).ceil().max(0.0) as usize + 1;
        Self {
            start: range.start,
            frame_rate,
            next: 0,
            count,
        }
    }

    /// Drop grid points at or past the end of the source, where no frame
    /// exists. The first point is always kept.
    pub fn within(mut self, source_duration: f64) -> Self {
        if source_duration.is_finite() {
            let available =
                ((source_duration - self.start) * self.frame_rate - GRID_TOLERANCE).ceil();
            self.count = self.count.min(available.max(1.0) as usize);
        }
        self
    }

    pub fn frame_interval(&self) -> f64 {
        1.0 / self.frame_rate
    }

    /// Number of samples in the whole grid
    pub fn total(&self) -> usize {
        self.count
    }

    /// Timestamp of sample `index`
    pub fn at(&self, index: usize) -> f64 {
        self.start + index as f64 / self.frame_rate
    }
}

impl Iterator for SampleTimestamps {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.next >= self.count {
            return None;
        }
        let timestamp = self.at(self.next);
        self.next += 1;
        Some(timestamp)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SampleTimestamps {}

/// How a seek ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOutcome {
    Completed,
    /// The element never confirmed; whatever it displays is used
    TimedOut,
}

/// Realizes sample timestamps on an element
pub struct FrameSampler;

impl FrameSampler {
    /// Keep seeks inside the source
    pub fn clamp_timestamp(timestamp: f64, duration: f64) -> f64 {
        let last = (duration - SEEK_EPSILON).max(0.0);
        timestamp.clamp(0.0, last)
    }

    /// Seek to `timestamp` and wait for the element, bounded by `timeout`
    pub async fn seek(
        element: &mut dyn VideoElement,
        timestamp: f64,
        duration: f64,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<SeekOutcome, DomainError> {
        cancel.check()?;
        let target = Self::clamp_timestamp(timestamp, duration);
        element.set_current_time(target);

        match race_signal(element.seeked(), timeout, cancel).await? {
            SignalOutcome::Signaled(()) => Ok(SeekOutcome::Completed),
            SignalOutcome::TimedOut => {
                let err = DomainError::SeekTimeout { timestamp: target };
                warn!(
                    error = %err,
                    timeout_ms = timeout.as_millis() as u64,
                    displayed = element.current_time(),
                    "Using the currently displayed frame"
                );
                Ok(SeekOutcome::TimedOut)
            }
        }
    }
}
