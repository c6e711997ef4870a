//! Patch records and callbacks.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use compact_str::CompactString;
use extsurface_core::{CallbackResult, ExtensionId, Value};
use strum::{Display, EnumString, IntoStaticStr};

use crate::module::{Args, Method, ModuleId, ModuleRef};

/// When a patch runs relative to the original method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum PatchKind {
    /// Runs before the original and may mutate the arguments.
    Before,
    /// Runs after the original and may replace the return value.
    After,
    /// Replaces the original call.
    Instead,
}

/// Callback of a `before` patch.
pub type BeforeFn = dyn Fn(&mut Args) -> CallbackResult<()> + Send + Sync;

/// Callback of an `after` patch. Returning `Some` replaces the return value.
pub type AfterFn = dyn Fn(&[Value], &Value) -> CallbackResult<Option<Value>> + Send + Sync;

/// Callback of an `instead` patch. Receives the original method, which it may call.
pub type InsteadFn = dyn Fn(&mut Args, &Method) -> CallbackResult<Value> + Send + Sync;

/// The behavior attached by a patch; its variant determines the [`PatchKind`].
#[derive(Clone)]
pub enum PatchCallback {
    Before(Arc<BeforeFn>),
    After(Arc<AfterFn>),
    Instead(Arc<InsteadFn>),
}

impl PatchCallback {
    /// Create a `before` callback.
    pub fn before(f: impl Fn(&mut Args) -> CallbackResult<()> + Send + Sync + 'static) -> Self {
        Self::Before(Arc::new(f))
    }

    /// Create an `after` callback.
    pub fn after(
        f: impl Fn(&[Value], &Value) -> CallbackResult<Option<Value>> + Send + Sync + 'static,
    ) -> Self {
        Self::After(Arc::new(f))
    }

    /// Create an `instead` callback.
    pub fn instead(
        f: impl Fn(&mut Args, &Method) -> CallbackResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self::Instead(Arc::new(f))
    }

    /// Kind of this callback.
    pub fn kind(&self) -> PatchKind {
        match self {
            Self::Before(_) => PatchKind::Before,
            Self::After(_) => PatchKind::After,
            Self::Instead(_) => PatchKind::Instead,
        }
    }
}

impl fmt::Debug for PatchCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PatchCallback::{}", self.kind())
    }
}

/// Index key of a patch target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetKey {
    pub module: ModuleId,
    pub method: CompactString,
}

/// A (module, method) pair identifying the function being intercepted.
#[derive(Clone)]
pub struct PatchTarget {
    module: ModuleRef,
    method: CompactString,
}

impl PatchTarget {
    /// Target `method` on `module`.
    pub fn new(module: ModuleRef, method: impl Into<CompactString>) -> Self {
        Self {
            module,
            method: method.into(),
        }
    }

    /// The module holding the method.
    pub fn module(&self) -> &ModuleRef {
        &self.module
    }

    /// The method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Index key of this target.
    pub fn key(&self) -> TargetKey {
        TargetKey {
            module: self.module.id(),
            method: self.method.clone(),
        }
    }
}

impl fmt::Display for PatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module.name(), self.method)
    }
}

impl fmt::Debug for PatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchTarget")
            .field("module", &self.module.name())
            .field("method", &self.method)
            .finish()
    }
}

/// Registry-unique id of a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchId(pub(crate) u64);

impl PatchId {
    /// Get the raw id.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// One interception entry attached by an owner to a target.
pub struct ChildPatch {
    id: PatchId,
    owner: ExtensionId,
    target: PatchTarget,
    callback: PatchCallback,
    enabled: AtomicBool,
    failures: AtomicU64,
}

impl ChildPatch {
    pub(crate) fn new(
        id: PatchId,
        owner: ExtensionId,
        target: PatchTarget,
        callback: PatchCallback,
    ) -> Self {
        Self {
            id,
            owner,
            target,
            callback,
            enabled: AtomicBool::new(true),
            failures: AtomicU64::new(0),
        }
    }

    /// Patch id.
    pub fn id(&self) -> PatchId {
        self.id
    }

    /// Extension that attached this patch.
    pub fn owner(&self) -> &ExtensionId {
        &self.owner
    }

    /// Intercepted target.
    pub fn target(&self) -> &PatchTarget {
        &self.target
    }

    /// Patch kind.
    pub fn kind(&self) -> PatchKind {
        self.callback.kind()
    }

    pub(crate) fn callback(&self) -> &PatchCallback {
        &self.callback
    }

    /// Whether the patch currently participates in calls.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Resume participating in calls.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    /// Stop participating in calls while keeping the patch attached.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Number of times the callback failed.
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Debug for ChildPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildPatch")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("target", &self.target)
            .field("kind", &self.kind())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Module;
    use std::str::FromStr;

    #[test]
    fn test_callback_kind() {
        assert_eq!(PatchCallback::before(|_| Ok(())).kind(), PatchKind::Before);
        assert_eq!(PatchCallback::after(|_, _| Ok(None)).kind(), PatchKind::After);
        assert_eq!(
            PatchCallback::instead(|_, _| Ok(Value::Null)).kind(),
            PatchKind::Instead
        );
    }

    #[test]
    fn test_patch_kind_strings() {
        assert_eq!(PatchKind::Instead.to_string(), "instead");
        assert_eq!(PatchKind::from_str("after").unwrap(), PatchKind::After);
    }

    #[test]
    fn test_target_display_and_key() {
        let module = Module::new("math").into_ref();
        let a = PatchTarget::new(module.clone(), "add");
        let b = PatchTarget::new(module, "add");

        assert_eq!(a.to_string(), "math.add");
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_enable_disable() {
        let module = Module::new("math").into_ref();
        let patch = ChildPatch::new(
            PatchId(1),
            ExtensionId::new("owner"),
            PatchTarget::new(module, "add"),
            PatchCallback::before(|_| Ok(())),
        );

        assert!(patch.is_enabled());
        patch.disable();
        assert!(!patch.is_enabled());
        patch.enable();
        assert!(patch.is_enabled());
    }
}
