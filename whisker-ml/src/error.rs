//! Recognition pipeline error types

use thiserror::Error;

/// Result type for recognition pipeline operations
pub type PipelineResult<T> = std::result::Result<T, RecognitionError>;

/// Recognition pipeline error taxonomy
///
/// Only `DecodeFailed`, `NoResolvableBreed`, and `Cancelled` ever reach callers
/// of the orchestrator. Bridge-tier errors are absorbed by the fallback cascade
/// and logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecognitionError {
    /// Native inference cannot be reached on this platform; the session runs
    /// fallback-only
    #[error("model bridge unavailable: {0}")]
    BridgeUnavailable(String),

    /// A single bridge call failed (bad input, native error, timeout)
    #[error("model bridge call failed: {0}")]
    BridgeCallFailed(String),

    /// Image bytes could not be read or decoded; fatal for the call
    #[error("image decode failed: {0}")]
    DecodeFailed(String),

    /// No prediction mapped to a known breed profile after all tiers
    #[error("no candidate breed could be resolved")]
    NoResolvableBreed,

    /// The caller's cancellation token fired mid-call
    #[error("recognition cancelled")]
    Cancelled,
}

impl RecognitionError {
    /// Whether this error is one of the caller-visible kinds
    pub fn is_caller_visible(&self) -> bool {
        matches!(
            self,
            RecognitionError::DecodeFailed(_)
                | RecognitionError::NoResolvableBreed
                | RecognitionError::Cancelled
        )
    }
}
