use std::time::Duration;

use crate::domain::errors::DomainError;
use crate::engine::sampler::{FrameSampler, SampleTimestamps, SeekOutcome};
use crate::engine::strategy::CaptureContext;
use crate::engine::EngineConfig;

/// Seek to each sample and push it while the encoder records (desktop)
pub struct StandardCapture {
    seek_timeout: Duration,
}

impl StandardCapture {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            seek_timeout: Duration::from_millis(config.seek_timeout_standard_ms),
        }
    }

    pub async fn run(&self, ctx: &mut CaptureContext<'_>) -> Result<(), DomainError> {
        let duration = ctx.duration();
        let samples = SampleTimestamps::new(ctx.range, ctx.preset.frame_rate).within(duration);

        for (index, timestamp) in samples.enumerate() {
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
            ctx.push_frame(index, timestamp, &frame).await?;
        }
        Ok(())
    }
}
