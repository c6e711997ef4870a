//! Modal handles with close notification.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use extsurface_core::sync::lock;

use crate::types::{ComponentRef, ModalSpec};

/// Host-assigned modal id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModalId(pub u64);

type CloseListener = Box<dyn FnOnce(ModalId) + Send>;

struct ModalInner {
    id: ModalId,
    spec: ModalSpec,
    component: ComponentRef,
    open: AtomicBool,
    listeners: Mutex<Vec<CloseListener>>,
}

/// A modal opened by a [`ModalHost`](crate::ModalHost).
///
/// Clones share state. The host calls [`mark_closed`](Self::mark_closed) when
/// the modal goes away for any reason (user action or a close request); close
/// listeners run exactly once, on the first transition.
#[derive(Clone)]
pub struct ModalHandle {
    inner: Arc<ModalInner>,
}

impl ModalHandle {
    /// Create an open modal. Called by host implementations.
    pub fn new(id: ModalId, spec: ModalSpec, component: ComponentRef) -> Self {
        Self {
            inner: Arc::new(ModalInner {
                id,
                spec,
                component,
                open: AtomicBool::new(true),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Modal id.
    pub fn id(&self) -> ModalId {
        self.inner.id
    }

    /// The request the modal was opened with.
    pub fn spec(&self) -> &ModalSpec {
        &self.inner.spec
    }

    /// Component rendered in the modal.
    pub fn component(&self) -> &ComponentRef {
        &self.inner.component
    }

    /// Whether the modal is still open.
    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Acquire)
    }

    /// Run `listener` when the modal closes; immediately if it already has.
    pub fn on_close(&self, listener: impl FnOnce(ModalId) + Send + 'static) {
        {
            let mut listeners = lock(&self.inner.listeners);
            if self.is_open() {
                listeners.push(Box::new(listener));
                return;
            }
        }
        listener(self.id());
    }

    /// Mark the modal closed and notify listeners.
    ///
    /// Returns `false` if it was already closed. Listeners run without any
    /// lock held.
    pub fn mark_closed(&self) -> bool {
        let listeners = {
            let mut listeners = lock(&self.inner.listeners);
            if !self.inner.open.swap(false, Ordering::AcqRel) {
                return false;
            }
            std::mem::take(&mut *listeners)
        };

        for listener in listeners {
            listener(self.id());
        }
        true
    }
}

impl PartialEq for ModalHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ModalHandle {}

impl fmt::Debug for ModalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalHandle")
            .field("id", &self.inner.id)
            .field("title", &self.inner.spec.title)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn modal() -> ModalHandle {
        ModalHandle::new(
            ModalId(1),
            ModalSpec::basic("Title", "Body"),
            ComponentRef::new("Base"),
        )
    }

    #[test]
    fn test_listeners_run_once() {
        let modal = modal();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        modal.on_close(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(modal.mark_closed());
        assert!(!modal.mark_closed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!modal.is_open());
    }

    #[test]
    fn test_listener_after_close_runs_immediately() {
        let modal = modal();
        modal.mark_closed();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        modal.on_close(move |id| {
            assert_eq!(id, ModalId(1));
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clones_are_equal() {
        let a = modal();
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, modal());
    }
}
