//! Access to other loaded content.

use extsurface_core::{ContentKind, ExtensionId, SurfaceError, SurfaceResult};
use extsurface_host::ExtensionHandle;

use crate::surface::ExtensionSurface;

/// Directory access of an [`ExtensionSurface`].
#[derive(Debug, Clone, Copy)]
pub struct Content<'a> {
    surface: &'a ExtensionSurface,
}

impl<'a> Content<'a> {
    pub(crate) fn new(surface: &'a ExtensionSurface) -> Self {
        Self { surface }
    }

    /// Ids of loaded content of `kind`.
    pub fn list(&self, kind: ContentKind) -> SurfaceResult<Vec<ExtensionId>> {
        self.surface.identity()?;
        Ok(self.surface.host().directory.list(kind))
    }

    /// Wait for content `id` of `kind`, up to the configured timeout.
    pub async fn get(&self, kind: ContentKind, id: &str) -> SurfaceResult<ExtensionHandle> {
        let identity = self.surface.identity()?;
        let timeout = self.surface.wait_timeout();
        tracing::debug!(target: "extsurface::surface", owner = %identity.id, %kind, id, "Waiting for content");

        match tokio::time::timeout(timeout, self.surface.host().directory.wait_for(kind, id)).await {
            Ok(Ok(handle)) => Ok(handle),
            Ok(Err(err)) => Err(SurfaceError::ContentUnavailable {
                id: id.to_string(),
                message: err.to_string(),
            }),
            Err(_) => Err(SurfaceError::ContentUnavailable {
                id: id.to_string(),
                message: format!("timed out after {}ms", timeout.as_millis()),
            }),
        }
    }
}
