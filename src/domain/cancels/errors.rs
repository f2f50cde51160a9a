use crate::gateway::{ReadError, WriteFailure, WriteFunction};

// ============================================================================
// Cancellation Cascade Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CancelError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Read failed: {0}")]
    Read(#[from] ReadError),

    #[error("{function} write failed: {failure}")]
    Write {
        function: WriteFunction,
        failure: WriteFailure,
    },

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(&'static str),
}

impl CancelError {
    /// Reason reported to the caller when the failure is a write failure.
    pub fn update_failure(&self) -> Option<&'static str> {
        match self {
            CancelError::Write { function, .. } => Some(function.failure_reason()),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CancelError::NotFound(_) => "not_found",
            CancelError::Read(_) => "read_failure",
            CancelError::Write { failure: WriteFailure::Rejected(_), .. } => "write_rejected",
            CancelError::Write { .. } => "write_transport",
            CancelError::Encode(_) => "encode_failure",
            CancelError::InvalidRequest(_) => "invalid_request",
        }
    }
}
