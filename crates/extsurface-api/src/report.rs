//! Outcomes of bulk operations.

use extsurface_core::{ResourceKind, SurfaceError};
use extsurface_host::ModalId;

/// Outcome of closing every tracked modal.
#[derive(Debug, Default)]
pub struct CloseAllReport {
    /// Modals closed by this call.
    pub closed: usize,
    /// Modals that were already gone when their turn came.
    pub already_closed: usize,
    /// Modals that refused or failed to close; they stay tracked.
    pub failures: Vec<(ModalId, SurfaceError)>,
}

impl CloseAllReport {
    /// Check if every modal is closed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of [`ExtensionSurface::teardown`](crate::ExtensionSurface::teardown).
#[derive(Debug, Default)]
pub struct TeardownReport {
    /// Patches detached.
    pub unpatched: usize,
    /// Event subscriptions removed.
    pub events: usize,
    /// Menu entries removed.
    pub menu_items: usize,
    /// Styles deleted.
    pub styles: usize,
    /// Modals closed.
    pub modals: usize,
    /// Every failure, tagged with the kind of resource that failed.
    pub failures: Vec<(ResourceKind, SurfaceError)>,
}

impl TeardownReport {
    /// Check if teardown released everything.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total number of released patches and resources.
    pub fn released(&self) -> usize {
        self.unpatched + self.events + self.menu_items + self.styles + self.modals
    }

    pub(crate) fn record<K>(&mut self, kind: ResourceKind, failures: Vec<(K, SurfaceError)>) {
        self.failures
            .extend(failures.into_iter().map(|(_, err)| (kind, err)));
    }
}

