//! Engine client error types.

use thiserror::Error;

/// Result type alias for engine client operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors reported by the container engine client.
///
/// `NotFound` is a distinguishable kind: removal-style callers treat it
/// as success, direct reads and control calls propagate it.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("engine api error: {0}")]
    Api(String),

    #[error("engine transport error: {0}")]
    Transport(String),

    #[error("engine call timed out: {0}")]
    Timeout(String),
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound(_))
    }
}
