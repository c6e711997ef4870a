//! Error types shared across the extension surface.

use std::path::PathBuf;

use thiserror::Error;

use crate::identity::ExtensionId;
use crate::stack::ResourceKind;

/// Boxed error used at collaborator boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error raised by a patch callback.
pub type CallbackError = BoxError;

/// Result type returned by patch callbacks.
pub type CallbackResult<T> = Result<T, CallbackError>;

/// Result type for surface operations.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Errors that can occur while using an extension surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The patch target could not be resolved to a function.
    #[error("Invalid patch target {module}.{method}: {reason}")]
    InvalidTarget {
        module: String,
        method: String,
        reason: String,
    },

    /// The owning extension can no longer be resolved.
    #[error("Extension at {path} can no longer be resolved")]
    UnresolvedIdentity { path: PathBuf },

    /// A patch callback failed.
    #[error("Patch callback of '{owner}' on {target} failed: {message}")]
    PatchCallback {
        owner: ExtensionId,
        target: String,
        message: String,
    },

    /// A host service refused or failed an operation.
    #[error("{kind} host error: {source}")]
    ResourceHost {
        kind: ResourceKind,
        #[source]
        source: BoxError,
    },

    /// Waiting for another extension or content item failed.
    #[error("Content '{id}' is unavailable: {message}")]
    ContentUnavailable { id: String, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SurfaceError {
    /// Wrap a host-side failure for the given resource kind.
    pub fn host(kind: ResourceKind, source: impl Into<BoxError>) -> Self {
        Self::ResourceHost {
            kind,
            source: source.into(),
        }
    }

    /// Check whether this error means the extension identity is gone.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::UnresolvedIdentity { .. })
    }
}
