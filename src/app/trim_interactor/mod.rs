// Trim interactor - Orchestrates the trim use case and its fallback chain

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::engine::{
    run_strategy, CancelToken, CaptureEnv, EngineConfig, LoadedVideo, MetadataLoader,
};
use crate::ports::*;

/// Request for one trim
#[derive(Debug, Clone)]
pub struct TrimRequest {
    pub source: SourceVideo,
    /// Requested start, seconds; clamped against the source
    pub start: f64,
    /// Requested end, seconds; clamped against the source
    pub end: f64,
    /// Overrides the configured trim quality
    pub quality: Option<QualityLevel>,
}

/// Interactor for the trim use case
pub struct TrimInteractor {
    media: Arc<dyn MediaPort>,
    observer: Arc<dyn ObserverPort>,
    config: EngineConfig,
    profile: DeviceProfile,
}

impl TrimInteractor {
    /// Create new trim interactor with injected ports
    pub fn new(
        media: Arc<dyn MediaPort>,
        observer: Arc<dyn ObserverPort>,
        config: EngineConfig,
        profile: DeviceProfile,
    ) -> Self {
        Self {
            media,
            observer,
            config,
            profile,
        }
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Trim `request.source` to the requested range.
    ///
    /// Only a failed first metadata load and cancellation are errors. Any
    /// capture failure ends, at worst, with the source handed back unchanged.
    pub async fn trim(
        &self,
        request: TrimRequest,
        cancel: &CancelToken,
    ) -> Result<TrimOutcome, DomainError> {
        let started = Instant::now();
        let loader = MetadataLoader::new(Arc::clone(&self.media), self.config.metadata);
        let mut warnings = Vec::new();

        self.state(TrimState::Idle);
        self.state(TrimState::MetadataLoading);
        let video = match loader.load(&request.source, &self.profile, cancel).await {
            Ok(video) => video,
            Err(err) => {
                self.state(TrimState::Failed);
                return Err(err);
            }
        };

        let source_duration = video.metadata.duration;
        let range = TrimRange::clamped(request.start, request.end, source_duration);
        if (range.start - request.start).abs() > 1e-9 || (range.end - request.end).abs() > 1e-9 {
            warnings.push(format!("Requested range adjusted to {}", range));
        }

        let preset = QualityPreset::for_trim(request.quality.unwrap_or(self.config.trim_quality));
        let primary = StrategySelector::select(&self.profile);
        info!(%range, %primary, quality = %preset.level, "Trimming");

        let env = CaptureEnv {
            media: self.media.as_ref(),
            profile: &self.profile,
            config: &self.config,
            cancel,
            observer: self.observer.as_ref(),
            operation: Operation::Trim,
        };

        let mut attempt = Some((primary, video));
        let mut failure = None;
        while let Some((strategy, video)) = attempt.take() {
            self.select(strategy);
            match self.capture(strategy, video, range, preset, &env).await {
                Ok(output) => {
                    let outcome = TrimOutcome {
                        video: output,
                        range,
                        source_duration,
                        strategy_used: Some(strategy),
                        fell_back_to_original: false,
                        warnings,
                        processing_time: started.elapsed(),
                    };
                    self.finish(&outcome);
                    return Ok(outcome);
                }
                Err(DomainError::Cancelled) => {
                    self.state(TrimState::Failed);
                    return Err(DomainError::Cancelled);
                }
                Err(err) => {
                    warnings.push(format!("{} capture failed: {}", strategy, err));
                    failure = Some(err.to_string());

                    let Some(next) = StrategySelector::fallback_for(strategy) else {
                        break;
                    };
                    warn!(from = %strategy, to = %next, error = %err, "Capture failed, retrying");
                    self.observer.on_event(&PipelineEvent::FallbackToStrategy {
                        from: strategy,
                        to: next,
                        reason: err.to_string(),
                    });
                    match self.reload(&loader, &request.source, cancel).await {
                        Ok(video) => attempt = Some((next, video)),
                        Err(DomainError::Cancelled) => {
                            self.state(TrimState::Failed);
                            return Err(DomainError::Cancelled);
                        }
                        Err(reload_err) => {
                            warnings.push(format!("{} capture skipped: {}", next, reload_err));
                            failure = Some(reload_err.to_string());
                        }
                    }
                }
            }
        }

        let reason = failure.unwrap_or_else(|| "no capture attempted".to_string());
        self.state(TrimState::Failed);
        warn!(%reason, "Every capture strategy failed, returning the original video");
        self.observer.on_event(&PipelineEvent::FallbackToOriginal {
            operation: Operation::Trim,
            reason: reason.clone(),
        });
        warnings.push("Trimming failed, the original video is used instead".to_string());

        let outcome = TrimOutcome {
            video: request.source.clone(),
            range,
            source_duration,
            strategy_used: None,
            fell_back_to_original: true,
            warnings,
            processing_time: started.elapsed(),
        };
        self.completed(&outcome);
        Ok(outcome)
    }

    async fn capture(
        &self,
        strategy: CaptureStrategy,
        video: LoadedVideo,
        range: TrimRange,
        preset: QualityPreset,
        env: &CaptureEnv<'_>,
    ) -> Result<OutputVideo, DomainError> {
        let (output, report) = run_strategy(strategy, video, range, preset, env).await?;
        if report.seek_timeouts > 0 {
            warn!(
                seek_timeouts = report.seek_timeouts,
                frames = report.frames,
                "Some frames may be stale"
            );
        }
        Ok(output)
    }

    // Each attempt needs a fresh element; a reload failure is not fatal here
    async fn reload(
        &self,
        loader: &MetadataLoader,
        source: &SourceVideo,
        cancel: &CancelToken,
    ) -> Result<LoadedVideo, DomainError> {
        self.state(TrimState::MetadataLoading);
        loader.load(source, &self.profile, cancel).await
    }

    fn select(&self, strategy: CaptureStrategy) {
        self.state(TrimState::StrategySelected);
        self.observer.on_event(&PipelineEvent::StrategySelected {
            operation: Operation::Trim,
            strategy,
        });
    }

    fn finish(&self, outcome: &TrimOutcome) {
        self.state(TrimState::Done);
        self.completed(outcome);
    }

    fn completed(&self, outcome: &TrimOutcome) {
        self.observer.on_event(&PipelineEvent::Completed {
            operation: Operation::Trim,
            bytes: outcome.video.len(),
            elapsed_ms: outcome.processing_time.as_millis(),
        });
    }

    fn state(&self, state: TrimState) {
        self.observer.on_event(&PipelineEvent::StateChanged {
            operation: Operation::Trim,
            state,
        });
    }
}
