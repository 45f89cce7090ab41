// Compress interactor - Orchestrates the network-aware compression use case

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::engine::{run_strategy, CancelToken, CaptureEnv, EngineConfig, MetadataLoader};
use crate::ports::*;

/// Request for one compression
#[derive(Debug, Clone)]
pub struct CompressRequest {
    pub source: SourceVideo,
    /// Explicit quality; detected from the network when absent
    pub quality: Option<QualityLevel>,
    /// Overrides the configured maximum duration, seconds
    pub max_duration: Option<f64>,
}

/// Interactor for the compression use case
pub struct CompressInteractor {
    media: Arc<dyn MediaPort>,
    network: Arc<dyn NetworkPort>,
    observer: Arc<dyn ObserverPort>,
    config: EngineConfig,
    profile: DeviceProfile,
}

impl CompressInteractor {
    /// Create new compress interactor with injected ports
    pub fn new(
        media: Arc<dyn MediaPort>,
        network: Arc<dyn NetworkPort>,
        observer: Arc<dyn ObserverPort>,
        config: EngineConfig,
        profile: DeviceProfile,
    ) -> Self {
        Self {
            media,
            network,
            observer,
            config,
            profile,
        }
    }

    /// Current network conditions and the quality they suggest
    pub fn network_conditions(&self) -> NetworkConditions {
        detect_network_conditions(self.network.connection().as_ref())
    }

    /// Compress `request.source`.
    ///
    /// Never fails except on cancellation: any other problem, or an output
    /// that is not smaller than the source, returns the source unchanged.
    pub async fn compress(
        &self,
        request: CompressRequest,
        cancel: &CancelToken,
    ) -> Result<CompressOutcome, DomainError> {
        let started = Instant::now();
        let quality = match request.quality {
            Some(quality) => quality,
            None => {
                let conditions = self.network_conditions();
                info!(
                    effective_type = ?conditions.effective_type,
                    downlink = ?conditions.downlink,
                    quality = %conditions.quality_recommendation,
                    "Quality chosen from network conditions"
                );
                conditions.quality_recommendation
            }
        };
        let preset = QualityPreset::for_level(quality);

        if preset.is_passthrough() {
            return Ok(self.finish(CompressOutcome {
                video: request.source.clone(),
                quality,
                compressed: false,
                warnings: Vec::new(),
                processing_time: started.elapsed(),
            }));
        }

        let max_duration = request
            .max_duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(self.config.compress_max_duration_secs);

        match self.capture(&request.source, preset, max_duration, cancel).await {
            Ok(output) if output.len() < request.source.len() => {
                self.state(TrimState::Done);
                Ok(self.finish(CompressOutcome {
                    video: output,
                    quality,
                    compressed: true,
                    warnings: Vec::new(),
                    processing_time: started.elapsed(),
                }))
            }
            Ok(output) => {
                let reason = format!(
                    "compressed output ({} bytes) is not smaller than the source ({} bytes)",
                    output.len(),
                    request.source.len()
                );
                self.state(TrimState::Done);
                Ok(self.finish(self.keep_original(request.source, quality, reason, started)))
            }
            Err(DomainError::Cancelled) => {
                self.state(TrimState::Failed);
                Err(DomainError::Cancelled)
            }
            Err(err) => {
                self.state(TrimState::Failed);
                let outcome =
                    self.keep_original(request.source, quality, err.to_string(), started);
                Ok(self.finish(outcome))
            }
        }
    }

    async fn capture(
        &self,
        source: &SourceVideo,
        preset: QualityPreset,
        max_duration: f64,
        cancel: &CancelToken,
    ) -> Result<OutputVideo, DomainError> {
        let loader = MetadataLoader::new(Arc::clone(&self.media), self.config.metadata);
        self.state(TrimState::Idle);
        self.state(TrimState::MetadataLoading);
        let video = loader.load(source, &self.profile, cancel).await?;

        let range = TrimRange::leading(video.metadata.duration, max_duration);
        let strategy = StrategySelector::select(&self.profile);
        info!(%range, %strategy, quality = %preset.level, "Compressing");
        self.state(TrimState::StrategySelected);
        self.observer.on_event(&PipelineEvent::StrategySelected {
            operation: Operation::Compress,
            strategy,
        });

        let env = CaptureEnv {
            media: self.media.as_ref(),
            profile: &self.profile,
            config: &self.config,
            cancel,
            observer: self.observer.as_ref(),
            operation: Operation::Compress,
        };
        let (output, _report) = run_strategy(strategy, video, range, preset, &env).await?;
        Ok(output)
    }

    fn keep_original(
        &self,
        source: SourceVideo,
        quality: QualityLevel,
        reason: String,
        started: Instant,
    ) -> CompressOutcome {
        warn!(%reason, "Compression skipped, keeping the original video");
        self.observer.on_event(&PipelineEvent::FallbackToOriginal {
            operation: Operation::Compress,
            reason: reason.clone(),
        });
        CompressOutcome {
            video: source,
            quality,
            compressed: false,
            warnings: vec![format!("Compression skipped: {}", reason)],
            processing_time: started.elapsed(),
        }
    }

    fn finish(&self, outcome: CompressOutcome) -> CompressOutcome {
        self.observer.on_event(&PipelineEvent::Completed {
            operation: Operation::Compress,
            bytes: outcome.video.len(),
            elapsed_ms: outcome.processing_time.as_millis(),
        });
        outcome
    }

    fn state(&self, state: TrimState) {
        self.observer.on_event(&PipelineEvent::StateChanged {
            operation: Operation::Compress,
            state,
        });
    }
}
