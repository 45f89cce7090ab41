//! Capture strategies and the deadline-bounded run that drives them.
//!
//! All three share the sampler and the re-encoder; they differ only in how
//! frames are obtained from the element.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{
    CaptureStrategy, DeviceProfile, Frame, OutputVideo, QualityPreset, TrimRange, TrimState,
};
use crate::domain::rules::OutputValidator;
use crate::engine::cancel::CancelToken;
use crate::engine::metadata::LoadedVideo;
use crate::engine::reencoder::ReEncoder;
use crate::engine::EngineConfig;
use crate::ports::{MediaPort, ObserverPort, Operation, PipelineEvent};

mod continuous;
mod discrete;
mod standard;

pub use continuous::ContinuousPlaybackCapture;
pub use discrete::DiscreteFrameCapture;
pub use standard::StandardCapture;

/// Collaborators shared by every capture attempt of one operation
pub struct CaptureEnv<'a> {
    pub media: &'a dyn MediaPort,
    pub profile: &'a DeviceProfile,
    pub config: &'a EngineConfig,
    pub cancel: &'a CancelToken,
    pub observer: &'a dyn ObserverPort,
    pub operation: Operation,
}

impl CaptureEnv<'_> {
    pub(crate) fn state(&self, state: TrimState) {
        self.observer.on_event(&PipelineEvent::StateChanged {
            operation: self.operation,
            state,
        });
    }
}

/// What a capture attempt did on its way to the output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureReport {
    pub frames: usize,
    pub seek_timeouts: usize,
    pub deadline_reached: bool,
}

/// Per-attempt state: the loaded element, the encoder once opened, and
/// progress counters. Dropping it releases everything.
pub struct CaptureContext<'a> {
    pub(crate) env: &'a CaptureEnv<'a>,
    pub(crate) video: LoadedVideo,
    pub(crate) range: TrimRange,
    pub(crate) preset: QualityPreset,
    encoder: Option<ReEncoder>,
    report: CaptureReport,
}

impl<'a> CaptureContext<'a> {
    fn new(
        env: &'a CaptureEnv<'a>,
        video: LoadedVideo,
        range: TrimRange,
        preset: QualityPreset,
    ) -> Self {
        Self {
            env,
            video,
            range,
            preset,
            encoder: None,
            report: CaptureReport::default(),
        }
    }

    pub(crate) fn duration(&self) -> f64 {
        self.video.metadata.duration
    }

    /// Output dimensions for the preset and this source
    pub(crate) fn target_dimensions(&self) -> (u32, u32) {
        let metadata = self.video.metadata;
        self.preset.target_dimensions(metadata.width, metadata.height)
    }

    pub(crate) fn note_seek_timeout(&mut self, timestamp: f64) {
        self.report.seek_timeouts += 1;
        self.env
            .observer
            .on_event(&PipelineEvent::SeekTimedOut { timestamp });
    }

    /// Push the frame for sample `index`, opening the encoder on first use
    pub(crate) async fn push_frame(
        &mut self,
        index: usize,
        timestamp: f64,
        frame: &Frame,
    ) -> Result<(), DomainError> {
        if self.encoder.is_none() {
            let metadata = self.video.metadata;
            let options =
                ReEncoder::options(self.env.profile, &self.preset, metadata.width, metadata.height)
                    .with_duration(self.range.span());
            let encoder =
                ReEncoder::open(self.env.media, options, self.env.cancel, self.env.observer)
                    .await?;
            self.encoder = Some(encoder);
            self.env.state(TrimState::Encoding);
        }
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| DomainError::EncodingSession("encoder not open".to_string()))?;

        let pts = (timestamp - self.range.start).max(0.0);
        encoder.push_frame(frame, pts)?;
        self.report.frames += 1;
        self.env
            .observer
            .on_event(&PipelineEvent::FrameCaptured { index, timestamp });
        Ok(())
    }
}

async fn dispatch(
    strategy: CaptureStrategy,
    ctx: &mut CaptureContext<'_>,
) -> Result<(), DomainError> {
    let config = ctx.env.config;
    match strategy {
        CaptureStrategy::Standard => StandardCapture::new(config).run(ctx).await,
        CaptureStrategy::DiscreteFrame => DiscreteFrameCapture::new(config).run(ctx).await,
        CaptureStrategy::ContinuousPlayback => {
            ContinuousPlaybackCapture::new(config).run(ctx).await
        }
    }
}

/// Run one capture attempt under the global deadline, then finalize and
/// validate its output.
///
/// On deadline the capture is abandoned and the encoder is closed with
/// whatever it produced so far.
pub async fn run_strategy(
    strategy: CaptureStrategy,
    video: LoadedVideo,
    range: TrimRange,
    preset: QualityPreset,
    env: &CaptureEnv<'_>,
) -> Result<(OutputVideo, CaptureReport), DomainError> {
    let started = Instant::now();
    let deadline = env.config.deadline.deadline(env.profile, range.span());
    let mut ctx = CaptureContext::new(env, video, range, preset);
    info!(%strategy, %range, deadline_secs = deadline.as_secs_f64(), "Starting capture");

    env.state(TrimState::Sampling);
    match tokio::time::timeout(deadline, dispatch(strategy, &mut ctx)).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => return Err(err),
        Err(_) => {
            warn!(
                %strategy,
                frames = ctx.report.frames,
                "Capture deadline reached, finalizing early"
            );
            ctx.report.deadline_reached = true;
            env.observer.on_event(&PipelineEvent::DeadlineReached {
                strategy,
                seconds: deadline.as_secs_f64(),
            });
        }
    }
    ctx.video.element.pause();

    env.state(TrimState::Finalizing);
    let encoder = match ctx.encoder.take() {
        Some(encoder) => encoder,
        None if ctx.report.deadline_reached => {
            return Err(DomainError::DeadlineExceeded {
                seconds: deadline.as_secs_f64(),
            })
        }
        None => return Err(DomainError::EmptyOutput { bytes: 0 }),
    };
    let output = encoder
        .close(
            Duration::from_millis(env.config.encoder_stop_timeout_ms),
            env.cancel,
        )
        .await?;

    if !OutputValidator::is_acceptable(&output, env.config.min_output_bytes) {
        return Err(DomainError::EmptyOutput {
            bytes: output.len(),
        });
    }

    debug!(
        %strategy,
        bytes = output.len(),
        frames = ctx.report.frames,
        seek_timeouts = ctx.report.seek_timeouts,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Capture finished"
    );
    Ok((output, ctx.report))
}
