//! Host service traits and the bridge that bundles them.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use extsurface_core::{ContentKind, ExtensionId, ExtensionIdentity};
use extsurface_patch::ModuleRef;

use crate::error::HostResult;
use crate::modal::ModalHandle;
use crate::query::ModuleQuery;
use crate::types::{
    CompileOptions, CompiledStyle, ComponentRef, EventCallback, ExtensionHandle, MenuItemHandle,
    MenuItemSpec, ModalSpec, SubscriptionId,
};

/// Type alias for boxed futures returned by async host methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Lookup of loaded extensions and other content.
pub trait ExtensionDirectory: Send + Sync {
    /// Identity of the extension currently loaded from `path`, if any.
    fn resolve_by_path(&self, path: &Path) -> Option<ExtensionIdentity>;

    /// Wait until content `id` of `kind` is loaded.
    ///
    /// Fails when the directory knows the content will never load.
    fn wait_for<'a>(
        &'a self,
        kind: ContentKind,
        id: &'a str,
    ) -> BoxFuture<'a, HostResult<ExtensionHandle>>;

    /// Ids of loaded content of `kind`.
    fn list(&self, kind: ContentKind) -> Vec<ExtensionId>;
}

/// Stylesheet compilation and injection.
pub trait StyleHost: Send + Sync {
    /// Compile style source to CSS.
    fn compile<'a>(
        &'a self,
        source: &'a str,
        options: &'a CompileOptions,
    ) -> BoxFuture<'a, HostResult<CompiledStyle>>;

    /// Inject `css` under `style_id`, replacing any style with that id.
    fn inject_style(&self, css: &str, style_id: &str) -> HostResult<()>;

    /// Remove the style with `style_id`. Removing an unknown id succeeds.
    fn delete_style(&self, style_id: &str) -> HostResult<()>;
}

/// The application menu.
pub trait MenuHost: Send + Sync {
    /// Add an entry.
    fn add_item(&self, spec: MenuItemSpec) -> HostResult<MenuItemHandle>;

    /// Remove an entry.
    fn remove_item(&self, item: &MenuItemHandle) -> HostResult<()>;

    /// Open the menu.
    fn open(&self) -> HostResult<()>;

    /// Close the menu.
    fn close(&self) -> HostResult<()>;
}

/// Modal dialogs.
pub trait ModalHost: Send + Sync {
    /// Open a modal rendering `component`.
    fn add_modal(&self, spec: ModalSpec, component: ComponentRef) -> HostResult<ModalHandle>;

    /// Close a modal; resolves once it is closed.
    ///
    /// Closing an already closed modal succeeds. Without `force`, a modal
    /// may refuse to close.
    fn close_modal<'a>(&'a self, modal: &'a ModalHandle, force: bool)
    -> BoxFuture<'a, HostResult<()>>;

    /// Component used by basic modals.
    fn base_component(&self) -> ComponentRef;
}

/// Lookup of patchable host modules.
pub trait ModuleHost: Send + Sync {
    /// Modules matching `query`, at most one when `first` is set.
    fn find_modules(&self, query: &ModuleQuery, first: bool) -> Vec<ModuleRef>;
}

/// Event subscriptions.
pub trait EventHost: Send + Sync {
    /// Subscribe `callback` to `event`.
    fn subscribe(&self, event: &str, callback: EventCallback) -> HostResult<SubscriptionId>;

    /// Remove a subscription. Removing an unknown subscription succeeds.
    fn unsubscribe(&self, id: SubscriptionId) -> HostResult<()>;
}

/// The set of host services an extension surface delegates to.
#[derive(Clone)]
pub struct HostBridge {
    pub directory: Arc<dyn ExtensionDirectory>,
    pub styles: Arc<dyn StyleHost>,
    pub menu: Arc<dyn MenuHost>,
    pub modals: Arc<dyn ModalHost>,
    pub modules: Arc<dyn ModuleHost>,
    pub events: Arc<dyn EventHost>,
}

impl std::fmt::Debug for HostBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBridge").finish_non_exhaustive()
    }
}
