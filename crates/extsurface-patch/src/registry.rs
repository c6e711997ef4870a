//! The patch registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use extsurface_core::ExtensionId;
use extsurface_core::sync::lock;
use indexmap::IndexSet;

use crate::chain::PatchChain;
use crate::error::{PatchError, PatchResult};
use crate::module::Method;
use crate::patch::{ChildPatch, PatchCallback, PatchId, PatchTarget, TargetKey};

/// A chain together with the wrapper currently installed in the module slot.
struct InstalledChain {
    chain: Arc<PatchChain>,
    wrapper: Method,
}

#[derive(Default)]
struct RegistryState {
    chains: HashMap<TargetKey, InstalledChain>,
    patches: HashMap<PatchId, Arc<ChildPatch>>,
    by_owner: HashMap<ExtensionId, IndexSet<PatchId>>,
}

/// Owner of every interception record.
///
/// One registry is created per host process and shared (behind an `Arc`) with
/// every extension surface. It is the only component that writes module
/// slots, so at most one wrapper is ever installed per target.
///
/// No callback runs while the registry lock is held: callbacks may attach or
/// detach patches, including their own.
#[derive(Default)]
pub struct PatchRegistry {
    state: Mutex<RegistryState>,
    next_id: AtomicU64,
}

impl PatchRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `callback` to `target` on behalf of `owner`.
    ///
    /// Installs the shared wrapper on the first patch for a target. The patch
    /// runs in attachment order relative to patches of the same kind.
    pub fn attach(
        &self,
        owner: ExtensionId,
        target: PatchTarget,
        callback: PatchCallback,
    ) -> PatchResult<Arc<ChildPatch>> {
        let mut state = lock(&self.state);
        let key = target.key();

        if !state.chains.contains_key(&key) {
            let installed = Self::install(&target)?;
            state.chains.insert(key.clone(), installed);
        }

        let id = PatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let kind = callback.kind();
        let patch = Arc::new(ChildPatch::new(id, owner.clone(), target, callback));

        if let Some(installed) = state.chains.get(&key) {
            installed.chain.push(Arc::clone(&patch));
        }
        state.patches.insert(id, Arc::clone(&patch));
        state.by_owner.entry(owner).or_default().insert(id);

        tracing::debug!(
            target: "extsurface::patch",
            owner = %patch.owner(),
            target_fn = %patch.target(),
            %kind,
            id = id.id(),
            "Attached patch"
        );

        Ok(patch)
    }

    /// Detach a patch. Returns `false` if it was already detached.
    ///
    /// Restores the original method once the last patch of a target is gone.
    /// Calls already in progress keep running with the patches they started with.
    ///
    /// Patches attached through another registry are never detached, even when
    /// their id collides with one of ours.
    pub fn detach(&self, patch: &ChildPatch) -> bool {
        let mut state = lock(&self.state);
        Self::holds(&state, patch) && Self::detach_locked(&mut state, patch.id())
    }

    /// Detach several patches. Returns how many were still attached.
    pub fn detach_many<'a>(&self, patches: impl IntoIterator<Item = &'a Arc<ChildPatch>>) -> usize {
        let mut state = lock(&self.state);
        patches
            .into_iter()
            .filter(|patch| {
                Self::holds(&state, patch) && Self::detach_locked(&mut state, patch.id())
            })
            .count()
    }

    /// Detach every patch attached by `owner`, across all targets.
    pub fn detach_all_by_owner(&self, owner: &ExtensionId) -> usize {
        let mut state = lock(&self.state);
        let Some(ids) = state.by_owner.get(owner).cloned() else {
            return 0;
        };

        let removed = ids
            .into_iter()
            .filter(|id| Self::detach_locked(&mut state, *id))
            .count();

        tracing::debug!(
            target: "extsurface::patch",
            %owner,
            removed,
            "Detached all patches of owner"
        );
        removed
    }

    /// Snapshot of the patches attached by `owner`, in attachment order.
    pub fn list_by_owner(&self, owner: &ExtensionId) -> Vec<Arc<ChildPatch>> {
        let state = lock(&self.state);
        state
            .by_owner
            .get(owner)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.patches.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check whether a wrapper is installed on `target`.
    pub fn is_patched(&self, target: &PatchTarget) -> bool {
        lock(&self.state).chains.contains_key(&target.key())
    }

    /// Owners that currently have at least one patch.
    pub fn owners(&self) -> Vec<ExtensionId> {
        lock(&self.state).by_owner.keys().cloned().collect()
    }

    /// Total number of attached patches.
    pub fn len(&self) -> usize {
        lock(&self.state).patches.len()
    }

    /// Check if no patches are attached.
    pub fn is_empty(&self) -> bool {
        lock(&self.state).patches.is_empty()
    }

    /// Number of targets with an installed wrapper.
    pub fn target_count(&self) -> usize {
        lock(&self.state).chains.len()
    }

    /// Detach every patch and restore every original method.
    pub fn clear(&self) -> usize {
        let mut state = lock(&self.state);
        let ids: Vec<PatchId> = state.patches.keys().copied().collect();
        ids.into_iter()
            .filter(|id| Self::detach_locked(&mut state, *id))
            .count()
    }

    fn install(target: &PatchTarget) -> PatchResult<InstalledChain> {
        let module = target.module();
        let invalid = |reason: &str| PatchError::InvalidTarget {
            module: module.name().to_string(),
            method: target.method().to_string(),
            reason: reason.to_string(),
        };

        let original = module
            .method(target.method())
            .ok_or_else(|| invalid("method is not defined"))?;
        let chain = Arc::new(PatchChain::new(target.clone(), Arc::clone(&original)));
        let wrapper = chain.wrapper();

        if !module.swap(target.method(), &original, Arc::clone(&wrapper)) {
            return Err(invalid("method changed while installing the wrapper"));
        }

        tracing::trace!(target: "extsurface::patch", target_fn = %target, "Installed wrapper");
        Ok(InstalledChain { chain, wrapper })
    }

    fn holds(state: &RegistryState, patch: &ChildPatch) -> bool {
        state
            .patches
            .get(&patch.id())
            .is_some_and(|stored| std::ptr::eq(Arc::as_ptr(stored), patch))
    }

    fn detach_locked(state: &mut RegistryState, id: PatchId) -> bool {
        let Some(patch) = state.patches.remove(&id) else {
            return false;
        };

        if let Some(ids) = state.by_owner.get_mut(patch.owner()) {
            ids.shift_remove(&id);
            if ids.is_empty() {
                state.by_owner.remove(patch.owner());
            }
        }

        let key = patch.target().key();
        let now_empty = state
            .chains
            .get(&key)
            .is_some_and(|installed| installed.chain.remove(id));

        if now_empty {
            if let Some(installed) = state.chains.remove(&key) {
                Self::uninstall(patch.target(), installed);
            }
        }

        true
    }

    fn uninstall(target: &PatchTarget, installed: InstalledChain) {
        let restored = target.module().swap(
            target.method(),
            &installed.wrapper,
            Arc::clone(installed.chain.original()),
        );
        if restored {
            tracing::trace!(target: "extsurface::patch", target_fn = %target, "Restored original");
        } else {
            tracing::warn!(
                target: "extsurface::patch",
                target_fn = %target,
                "Wrapper was replaced outside the registry; original not restored"
            );
        }
    }
}

impl std::fmt::Debug for PatchRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("PatchRegistry")
            .field("targets", &state.chains.len())
            .field("patches", &state.patches.len())
            .field("owners", &state.by_owner.len())
            .finish()
    }
}
