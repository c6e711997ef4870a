//! Scoped menu entries.

use extsurface_core::{RemoveAllReport, ResourceKind, SurfaceError, SurfaceResult};
use extsurface_host::{ComponentRef, MenuItemHandle, MenuItemSpec, MenuPayload, SettingsRef};

use crate::surface::{ExtensionSurface, host_error};

/// Menu operations of an [`ExtensionSurface`].
#[derive(Debug, Clone, Copy)]
pub struct MenuItems<'a> {
    surface: &'a ExtensionSurface,
}

impl<'a> MenuItems<'a> {
    pub(crate) fn new(surface: &'a ExtensionSurface) -> Self {
        Self { surface }
    }

    /// Add a menu entry.
    pub fn add(&self, spec: MenuItemSpec) -> SurfaceResult<MenuItemHandle> {
        let identity = self.surface.identity()?;
        let item = self
            .surface
            .host()
            .menu
            .add_item(spec)
            .map_err(host_error(ResourceKind::MenuItem))?;
        self.surface.menu_stack().push(item.clone());

        tracing::debug!(
            target: "extsurface::surface",
            owner = %identity.id,
            category = %item.category,
            text = %item.text,
            "Menu item added"
        );
        Ok(item)
    }

    /// Add a settings panel for `settings` under the configured category.
    pub fn add_bound(&self, settings: SettingsRef, text: impl Into<String>) -> SurfaceResult<MenuItemHandle> {
        let category = self.surface.config().menu_category.clone();
        self.add(MenuItemSpec::new(category, text, MenuPayload::Settings(settings)))
    }

    /// Add an entry rendering a custom component.
    pub fn add_component(
        &self,
        category: impl Into<String>,
        text: impl Into<String>,
        component: ComponentRef,
    ) -> SurfaceResult<MenuItemHandle> {
        self.add(MenuItemSpec::new(category, text, MenuPayload::Component(component)))
    }

    /// Remove an entry. Returns whether it was tracked by this extension.
    ///
    /// Entries added by other extensions are left alone.
    pub fn remove(&self, item: &MenuItemHandle) -> SurfaceResult<bool> {
        self.surface.identity()?;
        let stack = self.surface.menu_stack();
        let Some((handle, _)) = stack.find(|tracked| tracked == item) else {
            return Ok(false);
        };
        self.surface
            .host()
            .menu
            .remove_item(item)
            .map_err(host_error(ResourceKind::MenuItem))?;
        stack.remove(handle);
        Ok(true)
    }

    /// Remove every entry this extension added.
    pub fn remove_all(&self) -> SurfaceResult<RemoveAllReport<SurfaceError>> {
        self.surface.identity()?;
        Ok(self.remove_all_inner())
    }

    /// Entries currently added, oldest first.
    pub fn list(&self) -> Vec<MenuItemHandle> {
        self.surface.menu_stack().list()
    }

    /// Open the menu.
    pub fn open(&self) -> SurfaceResult<()> {
        self.surface.identity()?;
        self.surface
            .host()
            .menu
            .open()
            .map_err(host_error(ResourceKind::MenuItem))
    }

    /// Close the menu.
    pub fn close(&self) -> SurfaceResult<()> {
        self.surface.identity()?;
        self.surface
            .host()
            .menu
            .close()
            .map_err(host_error(ResourceKind::MenuItem))
    }

    pub(crate) fn remove_all_inner(&self) -> RemoveAllReport<SurfaceError> {
        let host = &self.surface.host().menu;
        self.surface
            .menu_stack()
            .remove_all(|item| host.remove_item(item).map_err(host_error(ResourceKind::MenuItem)))
    }
}
