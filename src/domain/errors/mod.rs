// Domain errors - Error types for the domain layer

use thiserror::Error;

/// Domain-specific error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Source could not be decoded or metadata never arrived
    #[error("Metadata load failed: {0}")]
    MetadataLoad(String),

    /// A single seek did not complete in time
    #[error("Seek to {timestamp:.3}s timed out")]
    SeekTimeout { timestamp: f64 },

    /// Streaming encoder refused to start
    #[error("Encoding session failed: {0}")]
    EncodingSession(String),

    /// Finalization produced zero or near-zero bytes
    #[error("Encoder produced empty output ({bytes} bytes)")]
    EmptyOutput { bytes: usize },

    /// Upload target answered with a non-2xx status or was unreachable
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Operation was cancelled by its owner
    #[error("Operation cancelled")]
    Cancelled,

    /// Global wall-clock deadline elapsed
    #[error("Deadline of {seconds:.1}s exceeded")]
    DeadlineExceeded { seconds: f64 },

    /// Frame data could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Capture strategy could not make progress
    #[error("Capture failed: {0}")]
    Capture(String),

    /// Invalid arguments provided
    #[error("Bad arguments: {0}")]
    BadArgs(String),

    /// Configuration could not be loaded or validated
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system error
    #[error("I/O error: {0}")]
    Io(String),

    /// Network error talking to an external collaborator
    #[error("Network error: {0}")]
    Network(String),
}

impl DomainError {
    /// Errors a trim falls back from instead of surfacing
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DomainError::Cancelled | DomainError::BadArgs(_))
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}
