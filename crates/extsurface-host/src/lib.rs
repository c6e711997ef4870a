//! Host service contracts for extsurface.
//!
//! An extension surface never talks to the UI, the style pipeline or the
//! extension loader directly. It goes through the narrow contracts defined
//! here, bundled in a [`HostBridge`]:
//!
//! - [`ExtensionDirectory`]: resolves extension identities and waits for content
//! - [`StyleHost`]: compiles and injects stylesheets
//! - [`MenuHost`]: adds and removes menu entries
//! - [`ModalHost`]: opens and closes modal dialogs
//! - [`ModuleHost`]: looks up patchable host modules
//! - [`EventHost`]: event subscriptions
//!
//! The [`memory`] module provides in-process implementations of every
//! contract, used by tests and the command line tool.

mod bridge;
mod error;
pub mod memory;
mod modal;
mod query;
mod types;

pub use bridge::{
    BoxFuture, EventHost, ExtensionDirectory, HostBridge, MenuHost, ModalHost, ModuleHost,
    StyleHost,
};
pub use error::{HostError, HostResult};
pub use modal::{ModalHandle, ModalId};
pub use query::ModuleQuery;
pub use types::{
    CompileOptions, CompiledStyle, ComponentRef, EventCallback, ExtensionHandle, MenuItemHandle,
    MenuItemSpec, MenuPayload, ModalSpec, SettingsRef, SubscriptionId,
};
