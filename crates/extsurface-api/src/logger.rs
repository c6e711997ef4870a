//! Logging attributed to an extension.

use std::fmt::Display;

use extsurface_core::SurfaceResult;
use tracing::Level;

use crate::surface::ExtensionSurface;

/// Logger of an [`ExtensionSurface`].
///
/// Records go to the `extsurface::ext` target with the extension's current
/// name and id attached.
#[derive(Debug, Clone, Copy)]
pub struct Logger<'a> {
    surface: &'a ExtensionSurface,
}

impl<'a> Logger<'a> {
    pub(crate) fn new(surface: &'a ExtensionSurface) -> Self {
        Self { surface }
    }

    /// Log at info level.
    pub fn log(&self, message: impl Display) -> SurfaceResult<()> {
        self.emit(Level::INFO, message)
    }

    /// Log at info level.
    pub fn info(&self, message: impl Display) -> SurfaceResult<()> {
        self.emit(Level::INFO, message)
    }

    /// Log at warn level.
    pub fn warn(&self, message: impl Display) -> SurfaceResult<()> {
        self.emit(Level::WARN, message)
    }

    /// Log at error level.
    pub fn err(&self, message: impl Display) -> SurfaceResult<()> {
        self.emit(Level::ERROR, message)
    }

    /// Log at debug level.
    pub fn dbg(&self, message: impl Display) -> SurfaceResult<()> {
        self.emit(Level::DEBUG, message)
    }

    fn emit(&self, level: Level, message: impl Display) -> SurfaceResult<()> {
        let identity = self.surface.identity()?;
        let extension = identity.name.as_str();
        let id = identity.id.as_str();
        match level {
            Level::ERROR => tracing::error!(target: "extsurface::ext", extension, id, "{message}"),
            Level::WARN => tracing::warn!(target: "extsurface::ext", extension, id, "{message}"),
            Level::INFO => tracing::info!(target: "extsurface::ext", extension, id, "{message}"),
            Level::DEBUG => tracing::debug!(target: "extsurface::ext", extension, id, "{message}"),
            _ => tracing::trace!(target: "extsurface::ext", extension, id, "{message}"),
        }
        Ok(())
    }
}
