// Tracing log adapter - Structured pipeline logging using the tracing crate

use tracing_subscriber::EnvFilter;

use crate::domain::errors::*;
use crate::ports::*;

/// Install the global subscriber once. `RUST_LOG` wins over `level`.
pub fn init_logging(level: LogLevel, json_output: bool) -> Result<(), DomainError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("swingtrim={}", level.as_str())));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if json_output {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| DomainError::Config(format!("Failed to initialize logging: {}", e)))
}

/// Observer that forwards pipeline events to `tracing`
pub struct TracingObserver {
    min_level: LogLevel,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Trace,
        }
    }

    /// Drop events below `level` before they reach the subscriber
    pub fn with_min_level(level: LogLevel) -> Self {
        Self { min_level: level }
    }

    fn should_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ObserverPort for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        if !self.should_log(event.level()) {
            return;
        }

        match event {
            PipelineEvent::StateChanged { operation, state } => {
                tracing::debug!(%operation, ?state, "State changed");
            }
            PipelineEvent::StrategySelected { operation, strategy } => {
                tracing::info!(%operation, %strategy, "Capture strategy selected");
            }
            PipelineEvent::FrameCaptured { index, timestamp } => {
                tracing::trace!(index, timestamp, "Frame captured");
            }
            PipelineEvent::SeekTimedOut { timestamp } => {
                tracing::debug!(timestamp, "Seek timed out");
            }
            PipelineEvent::EncoderRetry { reason } => {
                tracing::warn!(%reason, "Encoder retried with platform defaults");
            }
            PipelineEvent::DeadlineReached { strategy, seconds } => {
                tracing::warn!(%strategy, seconds, "Capture deadline reached");
            }
            PipelineEvent::FallbackToStrategy { from, to, reason } => {
                tracing::warn!(%from, %to, %reason, "Falling back to another strategy");
            }
            PipelineEvent::FallbackToOriginal { operation, reason } => {
                tracing::warn!(%operation, %reason, "Falling back to the original video");
            }
            PipelineEvent::Completed {
                operation,
                bytes,
                elapsed_ms,
            } => {
                tracing::info!(
                    %operation,
                    bytes,
                    elapsed_ms = *elapsed_ms as u64,
                    "Operation completed"
                );
            }
        }
    }
}
