//! In-process implementations of the host contracts.
//!
//! These hosts keep their state in memory and expose inspection and failure
//! injection helpers, which makes them suitable for tests, demos and headless
//! embedding.

mod directory;
mod events;
mod menu;
mod modal;
mod modules;
mod style;

use std::sync::Arc;

pub use directory::MemoryDirectory;
pub use events::MemoryEventHost;
pub use menu::MemoryMenuHost;
pub use modal::MemoryModalHost;
pub use modules::ModuleCatalog;
pub use style::MemoryStyleHost;

use crate::bridge::HostBridge;

/// All in-memory hosts, kept as concrete types for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    pub directory: Arc<MemoryDirectory>,
    pub styles: Arc<MemoryStyleHost>,
    pub menu: Arc<MemoryMenuHost>,
    pub modals: Arc<MemoryModalHost>,
    pub modules: Arc<ModuleCatalog>,
    pub events: Arc<MemoryEventHost>,
}

impl MemoryHost {
    /// Create a set of empty hosts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bridge backed by these hosts.
    pub fn bridge(&self) -> HostBridge {
        HostBridge {
            directory: self.directory.clone(),
            styles: self.styles.clone(),
            menu: self.menu.clone(),
            modals: self.modals.clone(),
            modules: self.modules.clone(),
            events: self.events.clone(),
        }
    }
}
