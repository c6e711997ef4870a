//! Method interception for extsurface.
//!
//! Host functionality that extensions may intercept is exposed through
//! [`Module`]s: named tables of methods that are always invoked through the
//! module, which makes the module slot the single indirection point a patch
//! can hook. The [`PatchRegistry`] owns every interception record and is the
//! only writer of module slots.
//!
//! # Execution order
//!
//! When a patched method is called, the installed wrapper runs:
//!
//! 1. every enabled `before` patch, in attachment order (may mutate arguments);
//! 2. the most recently attached enabled `instead` patch, or the original method;
//! 3. every enabled `after` patch, in attachment order (may replace the return value).
//!
//! Failing callbacks are logged and skipped; they never reach the caller.
//!
//! # Example
//!
//! ```ignore
//! use extsurface_patch::{Module, PatchCallback, PatchRegistry, PatchTarget};
//!
//! let module = Module::new("math")
//!     .with_method("add", |args| /* ... */)
//!     .into_ref();
//! let registry = PatchRegistry::new();
//!
//! registry.attach(
//!     "logger".into(),
//!     PatchTarget::new(module.clone(), "add"),
//!     PatchCallback::before(|args| Ok(())),
//! )?;
//! ```

mod chain;
mod error;
mod module;
mod patch;
mod registry;

pub use error::{PatchError, PatchResult};
pub use module::{Args, Method, Module, ModuleId, ModuleRef};
pub use patch::{
    AfterFn, BeforeFn, ChildPatch, InsteadFn, PatchCallback, PatchId, PatchKind, PatchTarget,
    TargetKey,
};
pub use registry::PatchRegistry;
