//! Core types for extsurface.
//!
//! This crate provides the building blocks shared by the patch registry, the
//! host contracts and the per-extension surface: extension identities, the
//! dynamic [`Value`] passed through patched methods, the [`ResourceStack`]
//! used to track live host resources, configuration and error types.

mod config;
mod error;
mod identity;
mod stack;
pub mod sync;
pub mod utils;
mod value;

pub use config::{SurfaceConfig, SurfaceConfigBuilder};
pub use error::{BoxError, CallbackError, CallbackResult, SurfaceError, SurfaceResult};
pub use identity::{ContentKind, ExtensionId, ExtensionIdentity};
pub use stack::{RemoveAllReport, ResourceKind, ResourceStack, StackHandle};
pub use value::Value;
