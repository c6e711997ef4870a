//! Scoped stylesheet injection.

use extsurface_core::{RemoveAllReport, ResourceKind, SurfaceError, SurfaceResult};
use extsurface_host::CompileOptions;
use serde::{Deserialize, Serialize};

use crate::surface::{ExtensionSurface, host_error};

/// A stylesheet this extension injected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectedStyle {
    /// Id chosen by the extension.
    pub local_id: String,
    /// Namespaced id the host knows the style by.
    pub style_id: String,
    /// Injected CSS.
    pub css: String,
}

/// Style operations of an [`ExtensionSurface`].
///
/// Style ids are namespaced with the extension id, so two extensions using
/// the same local id never collide.
#[derive(Debug, Clone, Copy)]
pub struct Styles<'a> {
    surface: &'a ExtensionSurface,
}

impl<'a> Styles<'a> {
    pub(crate) fn new(surface: &'a ExtensionSurface) -> Self {
        Self { surface }
    }

    /// Inject `css` under `id` (the configured default id when `None`).
    ///
    /// A live style with the same id is deleted first. Returns the host style id.
    pub fn inject(&self, id: Option<&str>, css: &str) -> SurfaceResult<String> {
        let identity = self.surface.identity()?;
        let config = self.surface.config();
        let local_id = id.unwrap_or(&config.default_style_id).to_string();
        let style_id = config.style_id(identity.id.as_str(), &local_id);

        self.delete_local(&local_id)?;

        self.surface
            .host()
            .styles
            .inject_style(css, &style_id)
            .map_err(host_error(ResourceKind::Style))?;
        self.surface.style_stack().push(InjectedStyle {
            local_id,
            style_id: style_id.clone(),
            css: css.to_string(),
        });

        tracing::debug!(target: "extsurface::surface", owner = %identity.id, style_id, "Style injected");
        Ok(style_id)
    }

    /// Compile `source` with the host's style compiler, then inject the result.
    pub async fn inject_compiled(
        &self,
        id: Option<&str>,
        source: &str,
        options: &CompileOptions,
    ) -> SurfaceResult<String> {
        self.surface.identity()?;
        let compiled = self
            .surface
            .host()
            .styles
            .compile(source, options)
            .await
            .map_err(host_error(ResourceKind::Style))?;
        self.inject(id, &compiled.css)
    }

    /// Delete the style with local `id`. Returns whether one was live.
    pub fn delete(&self, id: Option<&str>) -> SurfaceResult<bool> {
        self.surface.identity()?;
        let local_id = id.unwrap_or(&self.surface.config().default_style_id);
        self.delete_local(local_id)
    }

    /// Delete every style this extension injected.
    pub fn delete_all(&self) -> SurfaceResult<RemoveAllReport<SurfaceError>> {
        self.surface.identity()?;
        Ok(self.delete_all_inner())
    }

    /// Styles currently injected, oldest first.
    pub fn list(&self) -> Vec<InjectedStyle> {
        self.surface.style_stack().list()
    }

    fn delete_local(&self, local_id: &str) -> SurfaceResult<bool> {
        let stack = self.surface.style_stack();
        let mut deleted = false;
        for (handle, style) in stack.entries() {
            if style.local_id != local_id {
                continue;
            }
            self.surface
                .host()
                .styles
                .delete_style(&style.style_id)
                .map_err(host_error(ResourceKind::Style))?;
            stack.remove(handle);
            deleted = true;
        }
        Ok(deleted)
    }

    pub(crate) fn delete_all_inner(&self) -> RemoveAllReport<SurfaceError> {
        let host = &self.surface.host().styles;
        self.surface.style_stack().remove_all(|style| {
            host.delete_style(&style.style_id)
                .map_err(host_error(ResourceKind::Style))
        })
    }
}
