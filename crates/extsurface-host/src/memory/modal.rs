//! In-memory modal host.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use extsurface_core::sync::lock;
use indexmap::IndexMap;

use crate::bridge::{BoxFuture, ModalHost};
use crate::error::{HostError, HostResult};
use crate::modal::{ModalHandle, ModalId};
use crate::types::{ComponentRef, ModalSpec};

/// Name of the component used for basic modals.
pub const BASE_MODAL: &str = "BaseModal";

/// Modal host that tracks open modals in memory.
///
/// Closing yields to the scheduler before taking effect, so other tasks can
/// observe the modal while a close is in flight.
#[derive(Debug, Default)]
pub struct MemoryModalHost {
    open: Mutex<IndexMap<ModalId, ModalHandle>>,
    next_id: AtomicU64,
    failing: AtomicBool,
}

impl MemoryModalHost {
    /// Create a host with no open modals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently open modals, oldest first.
    pub fn open_modals(&self) -> Vec<ModalHandle> {
        lock(&self.open).values().cloned().collect()
    }

    /// Close a modal as if the user dismissed it.
    pub fn dismiss(&self, id: ModalId) -> bool {
        let handle = lock(&self.open).shift_remove(&id);
        match handle {
            Some(handle) => handle.mark_closed(),
            None => false,
        }
    }

    /// Make every open fail while set.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }
}

impl ModalHost for MemoryModalHost {
    fn add_modal(&self, spec: ModalSpec, component: ComponentRef) -> HostResult<ModalHandle> {
        if self.failing.load(Ordering::Acquire) {
            return Err(HostError::rejected(
                format!("modal '{}'", spec.title),
                "modals are disabled",
            ));
        }
        let id = ModalId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let handle = ModalHandle::new(id, spec, component);
        lock(&self.open).insert(id, handle.clone());
        Ok(handle)
    }

    fn close_modal<'a>(
        &'a self,
        modal: &'a ModalHandle,
        force: bool,
    ) -> BoxFuture<'a, HostResult<()>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            if !modal.is_open() {
                return Ok(());
            }
            if !force && !modal.spec().closable {
                return Err(HostError::rejected(
                    format!("closing modal '{}'", modal.spec().title),
                    "modal is not closable",
                ));
            }
            lock(&self.open).shift_remove(&modal.id());
            modal.mark_closed();
            Ok(())
        })
    }

    fn base_component(&self) -> ComponentRef {
        ComponentRef::new(BASE_MODAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_close_and_close_again() {
        let host = MemoryModalHost::new();
        let modal = host
            .add_modal(ModalSpec::basic("Hi", "there"), host.base_component())
            .unwrap();
        assert_eq!(host.open_modals().len(), 1);

        host.close_modal(&modal, false).await.unwrap();
        assert!(!modal.is_open());
        assert!(host.open_modals().is_empty());
        host.close_modal(&modal, false).await.unwrap();
    }

    #[tokio::test]
    async fn test_sticky_modal_needs_force() {
        let host = MemoryModalHost::new();
        let modal = host
            .add_modal(ModalSpec::basic("Busy", "").sticky(), host.base_component())
            .unwrap();

        let err = host.close_modal(&modal, false).await.unwrap_err();
        assert!(matches!(err, HostError::Rejected { .. }));
        assert!(modal.is_open());

        host.close_modal(&modal, true).await.unwrap();
        assert!(!modal.is_open());
    }

    #[test]
    fn test_dismiss_notifies_listeners() {
        let host = MemoryModalHost::new();
        let modal = host
            .add_modal(ModalSpec::basic("Hi", ""), host.base_component())
            .unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        modal.on_close(move |id| tx.send(id).unwrap());

        assert!(host.dismiss(modal.id()));
        assert!(!host.dismiss(modal.id()));
        assert_eq!(rx.try_recv().unwrap(), modal.id());
    }
}
