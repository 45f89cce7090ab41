//! Race a platform signal against a timeout and a cancellation token.

use std::future::Future;
use std::time::Duration;

use crate::domain::errors::DomainError;
use crate::engine::cancel::CancelToken;

/// Which side of the race finished first
#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome<T> {
    Signaled(T),
    TimedOut,
}

impl<T> SignalOutcome<T> {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, SignalOutcome::TimedOut)
    }
}

/// Wait for `signal`, but never longer than `timeout`.
///
/// Cancellation wins over both; a timeout is not an error, callers decide
/// how to proceed without the signal.
pub async fn race_signal<F>(
    signal: F,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<SignalOutcome<F::Output>, DomainError>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DomainError::Cancelled),
        value = signal => Ok(SignalOutcome::Signaled(value)),
        _ = tokio::time::sleep(timeout) => Ok(SignalOutcome::TimedOut),
    }
}

/// Wait for `future` unless the token fires first
pub async fn with_cancel<F>(future: F, cancel: &CancelToken) -> Result<F::Output, DomainError>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DomainError::Cancelled),
        value = future => Ok(value),
    }
}
