//! Per-extension capability surface.
//!
//! An [`ExtensionSurface`] is handed to one loaded extension. Everything the
//! extension does through it (injecting styles, adding menu entries, opening
//! modals, subscribing to events, patching host modules) is recorded against
//! the extension so that [`ExtensionSurface::teardown`] can revoke all of it.
//!
//! The surface never caches the extension's identity: each operation resolves
//! it again through the [`ExtensionDirectory`](extsurface_host::ExtensionDirectory),
//! so a surface created before a reload attributes work to the current load and
//! fails with [`SurfaceError::UnresolvedIdentity`] once the extension is gone.
//!
//! # Example
//!
//! ```ignore
//! use extsurface_api::ExtensionSurface;
//!
//! let surface = ExtensionSurface::new("/plugins/clock", registry, host.bridge(), config);
//!
//! surface.styles().inject(None, ".clock { color: red; }")?;
//! let modal = surface.modals().basic("Clock", "It is noon")?;
//! surface.patcher().after(target, |_, ret| Ok(Some(ret.clone())))?;
//!
//! let report = surface.teardown().await;
//! assert!(report.is_clean());
//! ```

mod content;
mod events;
mod logger;
mod menu;
mod modals;
mod modules;
mod patcher;
mod report;
mod styles;
mod surface;

pub use content::Content;
pub use events::{EventSubscription, Events};
pub use logger::Logger;
pub use menu::MenuItems;
pub use modals::Modals;
pub use modules::Modules;
pub use patcher::{ModulePatcher, Patcher};
pub use report::{CloseAllReport, TeardownReport};
pub use styles::{InjectedStyle, Styles};
pub use surface::ExtensionSurface;

pub use extsurface_core::utils;
pub use extsurface_core::{SurfaceError, SurfaceResult};
