use std::time::Duration;

use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::Yuv420Frame;
use crate::engine::sampler::{FrameSampler, SampleTimestamps, SeekOutcome};
use crate::engine::strategy::CaptureContext;
use crate::engine::surface::DrawingSurface;
use crate::engine::EngineConfig;

/// Capture every sample as a still first, then re-assemble the stills.
///
/// Slower than the standard loop, but the encoder only starts once all
/// decoding is done, which is what iOS decoders tolerate. Stills are held
/// as 4:2:0 planes at output size, within `max_still_bytes`.
pub struct DiscreteFrameCapture {
    seek_timeout: Duration,
    max_still_bytes: usize,
}

impl DiscreteFrameCapture {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            seek_timeout: Duration::from_millis(config.seek_timeout_discrete_ms),
            max_still_bytes: config.max_still_bytes,
        }
    }

    pub async fn run(&self, ctx: &mut CaptureContext<'_>) -> Result<(), DomainError> {
        let stills = self.capture_stills(ctx).await?;
        debug!(stills = stills.len(), "Stills captured, re-assembling");

        for (index, (timestamp, still)) in stills.iter().enumerate() {
            ctx.env.cancel.check()?;
            ctx.push_frame(index, *timestamp, &still.to_rgba()).await?;
        }
        Ok(())
    }

    async fn capture_stills(
        &self,
        ctx: &mut CaptureContext<'_>,
    ) -> Result<Vec<(f64, Yuv420Frame)>, DomainError> {
        let duration = ctx.duration();
        let samples = SampleTimestamps::new(ctx.range, ctx.preset.frame_rate).within(duration);
        let (width, height) = ctx.target_dimensions();
        let mut surface = DrawingSurface::new(width, height);
        let mut stills = Vec::with_capacity(samples.len());
        let mut held = 0usize;

        for timestamp in samples {
            let outcome = FrameSampler::seek(
                ctx.video.element.as_mut(),
                timestamp,
                duration,
                self.seek_timeout,
                ctx.env.cancel,
            )
            .await?;
            if outcome == SeekOutcome::TimedOut {
                ctx.note_seek_timeout(timestamp);
            }

            let frame = ctx.video.element.current_frame()?;
            surface.draw(&frame);
            let still = Yuv420Frame::from_rgba(surface.frame());
            held += still.len();
            if held > self.max_still_bytes {
                return Err(DomainError::Capture(format!(
                    "stills exceed {} bytes after {} frames",
                    self.max_still_bytes,
                    stills.len()
                )));
            }
            stills.push((timestamp, still));
        }

        if stills.is_empty() {
            return Err(DomainError::Capture("no stills captured".to_string()));
        }
        Ok(stills)
    }
}
