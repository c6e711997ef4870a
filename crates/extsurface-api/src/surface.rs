//! The per-extension facade.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use extsurface_core::sync::lock;
use extsurface_core::{
    ContentKind, ExtensionId, ExtensionIdentity, ResourceKind, ResourceStack, SurfaceConfig,
    SurfaceError, SurfaceResult, Value,
};
use extsurface_host::{HostBridge, HostError, MenuItemHandle, ModalHandle};
use extsurface_patch::PatchRegistry;

use crate::content::Content;
use crate::events::{EventSubscription, Events};
use crate::logger::Logger;
use crate::menu::MenuItems;
use crate::modals::Modals;
use crate::modules::Modules;
use crate::patcher::Patcher;
use crate::report::TeardownReport;
use crate::styles::{InjectedStyle, Styles};

/// Capability surface bound to one extension.
///
/// The surface is bound to the path the extension was loaded from; its
/// identity is looked up again on every call. Resource stacks are created on
/// first use.
pub struct ExtensionSurface {
    path: PathBuf,
    registry: Arc<PatchRegistry>,
    host: HostBridge,
    config: Arc<SurfaceConfig>,
    last_identity: Mutex<Option<ExtensionIdentity>>,
    styles: OnceLock<ResourceStack<InjectedStyle>>,
    menu: OnceLock<ResourceStack<MenuItemHandle>>,
    modals: OnceLock<Arc<ResourceStack<ModalHandle>>>,
    events: OnceLock<ResourceStack<EventSubscription>>,
}

impl ExtensionSurface {
    /// Create a surface for the extension loaded from `path`.
    pub fn new(
        path: impl Into<PathBuf>,
        registry: Arc<PatchRegistry>,
        host: HostBridge,
        config: Arc<SurfaceConfig>,
    ) -> Self {
        Self {
            path: path.into(),
            registry,
            host,
            config,
            last_identity: Mutex::new(None),
            styles: OnceLock::new(),
            menu: OnceLock::new(),
            modals: OnceLock::new(),
            events: OnceLock::new(),
        }
    }

    /// Path the surface is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Shared configuration.
    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// The process-wide patch registry.
    pub fn registry(&self) -> &Arc<PatchRegistry> {
        &self.registry
    }

    /// Resolve the identity of the extension currently loaded from the bound path.
    pub fn identity(&self) -> SurfaceResult<ExtensionIdentity> {
        match self.host.directory.resolve_by_path(&self.path) {
            Some(identity) => {
                *lock(&self.last_identity) = Some(identity.clone());
                Ok(identity)
            }
            None => Err(SurfaceError::UnresolvedIdentity {
                path: self.path.clone(),
            }),
        }
    }

    /// The identity seen by the last successful resolution.
    pub fn last_identity(&self) -> Option<ExtensionIdentity> {
        lock(&self.last_identity).clone()
    }

    /// Stylesheet injection.
    pub fn styles(&self) -> Styles<'_> {
        Styles::new(self)
    }

    /// Menu entries.
    pub fn menu(&self) -> MenuItems<'_> {
        MenuItems::new(self)
    }

    /// Modal dialogs.
    pub fn modals(&self) -> Modals<'_> {
        Modals::new(self)
    }

    /// Patching scoped to this extension.
    pub fn patcher(&self) -> Patcher<'_> {
        Patcher::new(self)
    }

    /// Event subscriptions.
    pub fn events(&self) -> Events<'_> {
        Events::new(self)
    }

    /// Logging attributed to this extension.
    pub fn logger(&self) -> Logger<'_> {
        Logger::new(self)
    }

    /// Host module lookup.
    pub fn modules(&self) -> Modules<'_> {
        Modules::new(self)
    }

    /// Other loaded content.
    pub fn content(&self) -> Content<'_> {
        Content::new(self)
    }

    /// Wait for the plugin `id` and return the value it exports.
    pub async fn bridge(&self, id: &str) -> SurfaceResult<Value> {
        let handle = self.content().get(ContentKind::Plugin, id).await?;
        Ok(handle.bridge)
    }

    /// Value exported by the ext-module `name`, or `None` if it is unavailable.
    pub async fn import(&self, name: &str) -> SurfaceResult<Option<Value>> {
        match self.content().get(ContentKind::ExtModule, name).await {
            Ok(handle) => Ok(Some(handle.bridge)),
            Err(SurfaceError::ContentUnavailable { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Revoke everything this extension registered.
    ///
    /// Runs in order: unpatch, unsubscribe events, remove menu entries, delete
    /// styles, close modals. Each step is best-effort and failures are collected
    /// in the report. When the identity can no longer be resolved, patches are
    /// removed for the last identity seen.
    pub async fn teardown(&self) -> TeardownReport {
        let owner: Option<ExtensionId> = match self.identity() {
            Ok(identity) => Some(identity.id),
            Err(_) => self.last_identity().map(|identity| identity.id),
        };

        let mut report = TeardownReport::default();
        match &owner {
            Some(owner) => report.unpatched = self.registry.detach_all_by_owner(owner),
            None => {
                tracing::warn!(
                    target: "extsurface::surface",
                    path = %self.path.display(),
                    "Extension was never resolved, skipping unpatch"
                );
            }
        }

        let events = self.events().remove_all_inner();
        report.events = events.destroyed;
        report.record(ResourceKind::Event, events.failures);

        let menu = self.menu().remove_all_inner();
        report.menu_items = menu.destroyed;
        report.record(ResourceKind::MenuItem, menu.failures);

        let styles = self.styles().delete_all_inner();
        report.styles = styles.destroyed;
        report.record(ResourceKind::Style, styles.failures);

        let modals = self
            .modals()
            .close_all_inner(self.config.force_close_on_teardown)
            .await;
        report.modals = modals.closed;
        report.record(ResourceKind::Modal, modals.failures);

        tracing::info!(
            target: "extsurface::surface",
            owner = owner.as_ref().map(ExtensionId::as_str).unwrap_or("<unknown>"),
            unpatched = report.unpatched,
            events = report.events,
            menu_items = report.menu_items,
            styles = report.styles,
            modals = report.modals,
            failures = report.failures.len(),
            "Extension torn down"
        );
        report
    }

    pub(crate) fn host(&self) -> &HostBridge {
        &self.host
    }

    pub(crate) fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.config.wait_timeout_ms)
    }

    pub(crate) fn style_stack(&self) -> &ResourceStack<InjectedStyle> {
        self.styles
            .get_or_init(|| ResourceStack::new(ResourceKind::Style))
    }

    pub(crate) fn menu_stack(&self) -> &ResourceStack<MenuItemHandle> {
        self.menu
            .get_or_init(|| ResourceStack::new(ResourceKind::MenuItem))
    }

    pub(crate) fn modal_stack(&self) -> &Arc<ResourceStack<ModalHandle>> {
        self.modals
            .get_or_init(|| Arc::new(ResourceStack::new(ResourceKind::Modal)))
    }

    pub(crate) fn event_stack(&self) -> &ResourceStack<EventSubscription> {
        self.events
            .get_or_init(|| ResourceStack::new(ResourceKind::Event))
    }
}

impl std::fmt::Debug for ExtensionSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionSurface")
            .field("path", &self.path)
            .field("last_identity", &self.last_identity())
            .finish_non_exhaustive()
    }
}

/// Wrap a host failure for `kind`.
pub(crate) fn host_error(kind: ResourceKind) -> impl FnOnce(HostError) -> SurfaceError {
    move |err| SurfaceError::host(kind, err)
}
