//! Scoped modal dialogs.

use std::sync::Arc;

use extsurface_core::{ResourceKind, StackHandle, SurfaceResult};
use extsurface_host::{ComponentRef, ModalHandle, ModalId, ModalSpec};
use futures::future::join_all;

use crate::report::CloseAllReport;
use crate::surface::{ExtensionSurface, host_error};

/// Modal operations of an [`ExtensionSurface`].
///
/// A tracked modal leaves the stack when it closes, whoever closed it. The
/// host's close notification fires once, so a user close racing with
/// [`close_all`](Self::close_all) cannot remove or close a modal twice.
#[derive(Debug, Clone, Copy)]
pub struct Modals<'a> {
    surface: &'a ExtensionSurface,
}

enum Closed {
    Now,
    Already,
}

impl<'a> Modals<'a> {
    pub(crate) fn new(surface: &'a ExtensionSurface) -> Self {
        Self { surface }
    }

    /// Open a modal rendering `component` and track it until it closes.
    pub fn add(&self, spec: ModalSpec, component: ComponentRef) -> SurfaceResult<ModalHandle> {
        let identity = self.surface.identity()?;
        let modal = self
            .surface
            .host()
            .modals
            .add_modal(spec, component)
            .map_err(host_error(ResourceKind::Modal))?;

        let stack = self.surface.modal_stack();
        let handle = stack.push(modal.clone());
        let tracked = Arc::downgrade(stack);
        modal.on_close(move |_| {
            if let Some(stack) = tracked.upgrade() {
                stack.remove(handle);
            }
        });

        tracing::debug!(
            target: "extsurface::surface",
            owner = %identity.id,
            modal = modal.id().0,
            title = %modal.spec().title,
            "Modal opened"
        );
        Ok(modal)
    }

    /// Open a closable modal with a title and body text.
    pub fn basic(&self, title: impl Into<String>, text: impl Into<String>) -> SurfaceResult<ModalHandle> {
        self.add(ModalSpec::basic(title, text), self.base_component())
    }

    /// Close `modal`. Closing an already closed modal succeeds.
    pub async fn close(&self, modal: &ModalHandle, force: bool) -> SurfaceResult<()> {
        self.surface.identity()?;
        let handle = self.surface.modal_stack().find(|tracked| tracked == modal);
        self.close_tracked(handle.map(|(handle, _)| handle), modal, force)
            .await
            .map(|_| ())
    }

    /// Close every tracked modal concurrently.
    ///
    /// Resolves once every close has settled. A modal that fails to close
    /// stays tracked and is listed in the report.
    pub async fn close_all(&self, force: bool) -> SurfaceResult<CloseAllReport> {
        self.surface.identity()?;
        Ok(self.close_all_inner(force).await)
    }

    /// Close the most recently opened tracked modal.
    ///
    /// Returns its id, or `None` when nothing is open.
    pub async fn close_last(&self, force: bool) -> SurfaceResult<Option<ModalId>> {
        self.surface.identity()?;
        let Some((handle, modal)) = self.surface.modal_stack().last() else {
            return Ok(None);
        };
        self.close_tracked(Some(handle), &modal, force).await?;
        Ok(Some(modal.id()))
    }

    /// Tracked modals, oldest first.
    pub fn stack(&self) -> Vec<ModalHandle> {
        self.surface.modal_stack().list()
    }

    /// Component used by [`basic`](Self::basic).
    pub fn base_component(&self) -> ComponentRef {
        self.surface.host().modals.base_component()
    }

    async fn close_tracked(
        &self,
        handle: Option<StackHandle>,
        modal: &ModalHandle,
        force: bool,
    ) -> SurfaceResult<Closed> {
        if !modal.is_open() {
            return Ok(Closed::Already);
        }
        self.surface
            .host()
            .modals
            .close_modal(modal, force)
            .await
            .map_err(host_error(ResourceKind::Modal))?;
        // The close listener normally does this already.
        if let Some(handle) = handle {
            self.surface.modal_stack().remove(handle);
        }
        Ok(Closed::Now)
    }

    pub(crate) async fn close_all_inner(&self, force: bool) -> CloseAllReport {
        let snapshot = self.surface.modal_stack().entries();
        let results = join_all(
            snapshot
                .iter()
                .map(|(handle, modal)| self.close_tracked(Some(*handle), modal, force)),
        )
        .await;

        let mut report = CloseAllReport::default();
        for ((_, modal), result) in snapshot.iter().zip(results) {
            match result {
                Ok(Closed::Now) => report.closed += 1,
                Ok(Closed::Already) => report.already_closed += 1,
                Err(err) => {
                    tracing::warn!(
                        target: "extsurface::surface",
                        modal = modal.id().0,
                        error = %err,
                        "Modal failed to close"
                    );
                    report.failures.push((modal.id(), err));
                }
            }
        }
        report
    }
}
