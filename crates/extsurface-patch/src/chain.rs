//! Per-target patch chains and the wrapper that executes them.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

use extsurface_core::sync::lock;
use extsurface_core::{CallbackError, SurfaceError, Value};

use crate::module::Method;
use crate::patch::{ChildPatch, PatchCallback, PatchId, PatchTarget};

/// All patches attached to one target, plus the method they wrap.
pub(crate) struct PatchChain {
    target: PatchTarget,
    original: Method,
    children: Mutex<Vec<Arc<ChildPatch>>>,
}

impl PatchChain {
    pub(crate) fn new(target: PatchTarget, original: Method) -> Self {
        Self {
            target,
            original,
            children: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn original(&self) -> &Method {
        &self.original
    }

    pub(crate) fn push(&self, patch: Arc<ChildPatch>) {
        lock(&self.children).push(patch);
    }

    /// Remove a patch. Returns whether the chain is now empty.
    pub(crate) fn remove(&self, id: PatchId) -> bool {
        let mut children = lock(&self.children);
        children.retain(|p| p.id() != id);
        children.is_empty()
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<ChildPatch>> {
        lock(&self.children).clone()
    }

    /// Build the wrapper installed in the module slot.
    pub(crate) fn wrapper(self: &Arc<Self>) -> Method {
        let chain = Arc::clone(self);
        Arc::new(move |args: &[Value]| chain.invoke(args))
    }

    /// Run the chain for one call.
    ///
    /// The patch list is snapshotted up front: patches attached or detached
    /// while the call runs (including by its own callbacks or by re-entrant
    /// calls) only affect later calls.
    pub(crate) fn invoke(&self, args: &[Value]) -> Value {
        let patches = self.snapshot();
        let mut args = args.to_vec();

        for patch in patches.iter().filter(|p| p.is_enabled()) {
            if let PatchCallback::Before(callback) = patch.callback() {
                self.guard(patch, || callback(&mut args));
            }
        }

        let instead = patches
            .iter()
            .rev()
            .filter(|p| p.is_enabled())
            .find_map(|p| match p.callback() {
                PatchCallback::Instead(callback) => Some((p, callback)),
                _ => None,
            });

        let mut ret = match instead {
            Some((patch, callback)) => self
                .guard(patch, || callback(&mut args, &self.original))
                .unwrap_or_default(),
            None => (self.original)(&args),
        };

        for patch in patches.iter().filter(|p| p.is_enabled()) {
            if let PatchCallback::After(callback) = patch.callback() {
                if let Some(Some(replacement)) = self.guard(patch, || callback(&args, &ret)) {
                    ret = replacement;
                }
            }
        }

        ret
    }

    /// Run one callback, containing both errors and panics.
    fn guard<T>(
        &self,
        patch: &ChildPatch,
        f: impl FnOnce() -> Result<T, CallbackError>,
    ) -> Option<T> {
        let message = match catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => return Some(value),
            Ok(Err(err)) => err.to_string(),
            Err(panic) => panic_message(panic.as_ref()),
        };

        patch.record_failure();
        let error = SurfaceError::PatchCallback {
            owner: patch.owner().clone(),
            target: self.target.to_string(),
            message,
        };
        tracing::warn!(
            target: "extsurface::patch",
            owner = %patch.owner(),
            module = self.target.module().name(),
            method = self.target.method(),
            kind = %patch.kind(),
            "{error}"
        );
        None
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Module;
    use crate::patch::PatchId;
    use extsurface_core::ExtensionId;

    fn chain_with(patches: Vec<PatchCallback>) -> PatchChain {
        let module = Module::new("math").into_ref();
        let target = PatchTarget::new(module, "double");
        let original: Method = Arc::new(|args: &[Value]| {
            Value::from(args.first().and_then(Value::as_i64).unwrap_or(0) * 2)
        });
        let chain = PatchChain::new(target.clone(), original);
        for (i, callback) in patches.into_iter().enumerate() {
            chain.push(Arc::new(ChildPatch::new(
                PatchId(i as u64),
                ExtensionId::new("test"),
                target.clone(),
                callback,
            )));
        }
        chain
    }

    #[test]
    fn test_empty_chain_calls_original() {
        let chain = chain_with(vec![]);
        assert_eq!(chain.invoke(&[Value::from(4)]), Value::from(8));
    }

    #[test]
    fn test_before_mutation_reaches_original() {
        let chain = chain_with(vec![PatchCallback::before(|args| {
            args[0] = Value::from(10);
            Ok(())
        })]);
        assert_eq!(chain.invoke(&[Value::from(1)]), Value::from(20));
    }

    #[test]
    fn test_failing_instead_yields_null() {
        let chain = chain_with(vec![PatchCallback::instead(|_, _| Err("boom".into()))]);
        assert_eq!(chain.invoke(&[Value::from(1)]), Value::Null);
        assert_eq!(chain.snapshot()[0].failure_count(), 1);
    }

    #[test]
    fn test_panicking_before_is_contained() {
        let chain = chain_with(vec![PatchCallback::before(|_| panic!("bad patch"))]);
        assert_eq!(chain.invoke(&[Value::from(3)]), Value::from(6));
        assert_eq!(chain.snapshot()[0].failure_count(), 1);
    }

    #[test]
    fn test_after_none_keeps_value() {
        let chain = chain_with(vec![
            PatchCallback::after(|_, ret| Ok(Some(Value::from(ret.as_i64().unwrap_or(0) + 1)))),
            PatchCallback::after(|_, _| Ok(None)),
        ]);
        assert_eq!(chain.invoke(&[Value::from(2)]), Value::from(5));
    }
}
