//! Errors of the patch registry.

use extsurface_core::SurfaceError;
use thiserror::Error;

/// Result type for patch operations.
pub type PatchResult<T> = Result<T, PatchError>;

/// Errors that can occur while resolving or patching module methods.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The target method does not exist on the module.
    #[error("Invalid patch target {module}.{method}: {reason}")]
    InvalidTarget {
        module: String,
        method: String,
        reason: String,
    },

    /// A method with this name is already defined.
    #[error("Method {module}.{method} is already defined")]
    AlreadyDefined { module: String, method: String },

    /// Calling a method that does not exist.
    #[error("Unknown method {module}.{method}")]
    UnknownMethod { module: String, method: String },
}

impl From<PatchError> for SurfaceError {
    fn from(err: PatchError) -> Self {
        match err {
            PatchError::InvalidTarget {
                module,
                method,
                reason,
            } => SurfaceError::InvalidTarget {
                module,
                method,
                reason,
            },
            PatchError::UnknownMethod { module, method } => SurfaceError::InvalidTarget {
                module,
                method,
                reason: "method is not defined".to_string(),
            },
            PatchError::AlreadyDefined { module, method } => SurfaceError::InvalidTarget {
                module,
                method,
                reason: "method is already defined".to_string(),
            },
        }
    }
}
