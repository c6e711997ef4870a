//! Host service errors.

use thiserror::Error;

/// Result type for host service calls.
pub type HostResult<T> = Result<T, HostError>;

/// Errors reported by host services.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host refused the operation.
    #[error("Host rejected {action}: {reason}")]
    Rejected { action: String, reason: String },

    /// The referenced item does not exist.
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    /// Style source could not be compiled.
    #[error("Style compilation failed: {message}")]
    Compile { message: String },

    /// The service cannot be reached.
    #[error("Host service '{service}' is unavailable")]
    Unavailable { service: &'static str },

    /// A module query could not be built.
    #[error("Invalid module query: {0}")]
    Query(#[from] globset::Error),
}

impl HostError {
    /// Create a rejection error.
    pub fn rejected(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            action: action.into(),
            reason: reason.into(),
        }
    }
}
