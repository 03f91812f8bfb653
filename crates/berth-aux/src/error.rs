//! Error kinds for auxiliary-service operations.

use thiserror::Error;

use berth_engine::EngineError;
use berth_state::StateError;

/// Result type alias for orchestrator operations.
pub type AuxResult<T> = Result<T, AuxError>;

/// The four error kinds surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum AuxError {
    /// Bad request shape, disallowed image, unknown service ref.
    /// Raised before any side effect.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Caller-supplied parent deployment ID does not match the record.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Unknown auxiliary ID, zero rows affected on update/delete, or a
    /// directly-queried engine resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Engine/store failures, job failures, commit failures.
    #[error("internal: {0}")]
    Internal(String),
}

impl AuxError {
    /// Collapse any kind into `Internal`, keeping the message.
    pub fn into_internal(self) -> AuxError {
        match self {
            AuxError::Internal(msg) => AuxError::Internal(msg),
            other => AuxError::Internal(other.to_string()),
        }
    }
}

impl From<StateError> for AuxError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::NotFound(what) => AuxError::NotFound(what),
            other => AuxError::Internal(other.to_string()),
        }
    }
}

impl From<EngineError> for AuxError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound(what) => AuxError::NotFound(what),
            other => AuxError::Internal(other.to_string()),
        }
    }
}
