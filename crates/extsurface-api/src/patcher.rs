//! Patching scoped to one extension.

use std::sync::Arc;

use extsurface_core::{CallbackResult, SurfaceResult, Value};
use compact_str::CompactString;
use extsurface_patch::{Args, ChildPatch, Method, ModuleRef, PatchCallback, PatchTarget};

use crate::surface::ExtensionSurface;

/// Patch operations of an [`ExtensionSurface`].
///
/// Every patch is attached with the extension's current identity as owner, so
/// [`unpatch_all`](Self::unpatch_all) and teardown can find it again.
#[derive(Debug, Clone, Copy)]
pub struct Patcher<'a> {
    surface: &'a ExtensionSurface,
}

impl<'a> Patcher<'a> {
    pub(crate) fn new(surface: &'a ExtensionSurface) -> Self {
        Self { surface }
    }

    /// Attach `callback` to `target`; the kind follows from the callback.
    pub fn push_child_patch(
        &self,
        target: PatchTarget,
        callback: PatchCallback,
    ) -> SurfaceResult<Arc<ChildPatch>> {
        let identity = self.surface.identity()?;
        let patch = self
            .surface
            .registry()
            .attach(identity.id, target, callback)?;
        Ok(patch)
    }

    /// Run `callback` before `target`; it may rewrite the arguments.
    pub fn before(
        &self,
        target: PatchTarget,
        callback: impl Fn(&mut Args) -> CallbackResult<()> + Send + Sync + 'static,
    ) -> SurfaceResult<Arc<ChildPatch>> {
        self.push_child_patch(target, PatchCallback::before(callback))
    }

    /// Run `callback` after `target`; returning `Some` replaces the result.
    pub fn after(
        &self,
        target: PatchTarget,
        callback: impl Fn(&[Value], &Value) -> CallbackResult<Option<Value>> + Send + Sync + 'static,
    ) -> SurfaceResult<Arc<ChildPatch>> {
        self.push_child_patch(target, PatchCallback::after(callback))
    }

    /// Run `callback` in place of `target`. It receives the original method.
    pub fn instead(
        &self,
        target: PatchTarget,
        callback: impl Fn(&mut Args, &Method) -> CallbackResult<Value> + Send + Sync + 'static,
    ) -> SurfaceResult<Arc<ChildPatch>> {
        self.push_child_patch(target, PatchCallback::instead(callback))
    }

    /// Detach the given patches. Patches owned by other extensions are ignored.
    ///
    /// Returns how many were detached.
    pub fn unpatch(&self, patches: &[Arc<ChildPatch>]) -> SurfaceResult<usize> {
        let identity = self.surface.identity()?;
        let owned = patches.iter().filter(|patch| *patch.owner() == identity.id);
        Ok(self.surface.registry().detach_many(owned))
    }

    /// Detach every patch this extension owns.
    pub fn unpatch_all(&self) -> SurfaceResult<usize> {
        let identity = self.surface.identity()?;
        let detached = self.surface.registry().detach_all_by_owner(&identity.id);
        tracing::debug!(target: "extsurface::surface", owner = %identity.id, detached, "Unpatched all");
        Ok(detached)
    }

    /// Patches this extension owns, in attachment order.
    pub fn patches(&self) -> SurfaceResult<Vec<Arc<ChildPatch>>> {
        let identity = self.surface.identity()?;
        Ok(self.surface.registry().list_by_owner(&identity.id))
    }

    /// Bind `module` so patches only need a method name.
    pub fn monkey_patch(&self, module: ModuleRef) -> SurfaceResult<ModulePatcher<'a>> {
        self.surface.identity()?;
        Ok(ModulePatcher {
            patcher: *self,
            module,
        })
    }
}

/// Patches methods of one module on behalf of an [`ExtensionSurface`].
///
/// The owner is resolved on every call, like every other surface operation,
/// so a patcher kept past an unload fails with `UnresolvedIdentity`.
#[derive(Debug, Clone)]
pub struct ModulePatcher<'a> {
    patcher: Patcher<'a>,
    module: ModuleRef,
}

impl ModulePatcher<'_> {
    /// The bound module.
    pub fn module(&self) -> &ModuleRef {
        &self.module
    }

    fn target(&self, method: impl Into<CompactString>) -> PatchTarget {
        PatchTarget::new(Arc::clone(&self.module), method)
    }

    /// Attach a `before` patch to `method`.
    pub fn before(
        &self,
        method: impl Into<CompactString>,
        callback: impl Fn(&mut Args) -> CallbackResult<()> + Send + Sync + 'static,
    ) -> SurfaceResult<Arc<ChildPatch>> {
        self.patcher.before(self.target(method), callback)
    }

    /// Attach an `after` patch to `method`.
    pub fn after(
        &self,
        method: impl Into<CompactString>,
        callback: impl Fn(&[Value], &Value) -> CallbackResult<Option<Value>> + Send + Sync + 'static,
    ) -> SurfaceResult<Arc<ChildPatch>> {
        self.patcher.after(self.target(method), callback)
    }

    /// Attach an `instead` patch to `method`.
    pub fn instead(
        &self,
        method: impl Into<CompactString>,
        callback: impl Fn(&mut Args, &Method) -> CallbackResult<Value> + Send + Sync + 'static,
    ) -> SurfaceResult<Arc<ChildPatch>> {
        self.patcher.instead(self.target(method), callback)
    }

    /// Patches this extension owns on the bound module.
    pub fn patches(&self) -> SurfaceResult<Vec<Arc<ChildPatch>>> {
        let mut patches = self.patcher.patches()?;
        patches.retain(|p| p.target().module().id() == self.module.id());
        Ok(patches)
    }

    /// Detach this extension's patches on the bound module only.
    pub fn unpatch_all(&self) -> SurfaceResult<usize> {
        let patches = self.patches()?;
        self.patcher.unpatch(&patches)
    }
}
