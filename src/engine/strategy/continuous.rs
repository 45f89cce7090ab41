use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::Frame;
use crate::engine::sampler::{FrameSampler, SampleTimestamps, SeekOutcome};
use crate::engine::signal::{race_signal, SignalOutcome};
use crate::engine::strategy::CaptureContext;
use crate::engine::EngineConfig;

/// Play the element from the range start and grab presented frames.
///
/// Each presented frame fills every sample point it covers, so a decoder
/// that presents fewer frames than the output rate still yields a full grid.
pub struct ContinuousPlaybackCapture {
    seek_timeout: Duration,
    frame_wait: Duration,
    max_stalled_frames: u32,
}

impl ContinuousPlaybackCapture {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            seek_timeout: Duration::from_millis(config.seek_timeout_standard_ms),
            frame_wait: Duration::from_millis(config.frame_wait_ms),
            max_stalled_frames: config.max_stalled_frames,
        }
    }

    pub async fn run(&self, ctx: &mut CaptureContext<'_>) -> Result<(), DomainError> {
        let duration = ctx.duration();
        let samples = SampleTimestamps::new(ctx.range, ctx.preset.frame_rate).within(duration);
        let half_interval = samples.frame_interval() / 2.0;
        let total = samples.total();

        let outcome = FrameSampler::seek(
            ctx.video.element.as_mut(),
            ctx.range.start,
            duration,
            self.seek_timeout,
            ctx.env.cancel,
        )
        .await?;
        if outcome == SeekOutcome::TimedOut {
            ctx.note_seek_timeout(ctx.range.start);
        }
        ctx.video.element.play(1.0).await?;

        let mut next = 0;
        let mut stalled = 0;
        let mut last_frame: Option<Frame> = None;

        while next < total {
            if ctx.video.element.is_ended() {
                break;
            }
            let presented = race_signal(
                ctx.video.element.next_frame(),
                self.frame_wait,
                ctx.env.cancel,
            )
            .await?;

            let media_time = match presented {
                SignalOutcome::Signaled(media_time) => media_time,
                SignalOutcome::TimedOut => {
                    stalled += 1;
                    if stalled >= self.max_stalled_frames {
                        ctx.video.element.pause();
                        return Err(DomainError::Capture(format!(
                            "playback stalled after {} of {} frames",
                            next, total
                        )));
                    }
                    continue;
                }
            };
            stalled = 0;

            if media_time + half_interval < samples.at(next) {
                continue;
            }
            let frame = ctx.video.element.current_frame()?;
            while next < total && samples.at(next) <= media_time + half_interval {
                ctx.push_frame(next, samples.at(next), &frame).await?;
                next += 1;
            }
            last_frame = Some(frame);
        }
        ctx.video.element.pause();

        if next < total {
            // playback ended before every sample point was presented
            let Some(frame) = last_frame else {
                return Err(DomainError::Capture(
                    "playback ended before the range start".to_string(),
                ));
            };
            warn!(
                missing = total - next,
                "Playback ended early, repeating the last frame"
            );
            while next < total {
                ctx.push_frame(next, samples.at(next), &frame).await?;
                next += 1;
            }
        }

        debug!(frames = total, "Playback capture complete");
        Ok(())
    }
}
