//! Value types exchanged with host services.

use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;
use extsurface_core::{ContentKind, ExtensionIdentity, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Opaque reference to a UI component known to the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentRef(CompactString);

impl ComponentRef {
    /// Reference a component by name.
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self(name.into())
    }

    /// Component name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to a settings set owned by the settings service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsRef(CompactString);

impl SettingsRef {
    /// Reference a settings set by id.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    /// Settings set id.
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// What a menu entry shows when selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MenuPayload {
    /// Arbitrary data interpreted by the host.
    Value(Value),
    /// A settings panel bound to a settings set.
    Settings(SettingsRef),
    /// A custom component.
    Component(ComponentRef),
}

/// Request to add a menu entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemSpec {
    /// Menu category (section).
    pub category: String,
    /// Entry label.
    pub text: String,
    /// Entry contents.
    pub payload: MenuPayload,
}

impl MenuItemSpec {
    /// Create a menu entry request.
    pub fn new(category: impl Into<String>, text: impl Into<String>, payload: MenuPayload) -> Self {
        Self {
            category: category.into(),
            text: text.into(),
            payload,
        }
    }
}

/// A menu entry live in the menu host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MenuItemHandle {
    /// Host-assigned id.
    pub id: u64,
    /// Menu category.
    pub category: String,
    /// Entry label.
    pub text: String,
}

/// Request to open a modal dialog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalSpec {
    /// Title bar text.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub text: String,
    /// Whether a non-forced close is allowed.
    #[serde(default = "default_closable")]
    pub closable: bool,
}

fn default_closable() -> bool {
    true
}

impl ModalSpec {
    /// A closable modal with a title and body text.
    pub fn basic(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            closable: true,
        }
    }

    /// Require `force` to close this modal.
    pub fn sticky(mut self) -> Self {
        self.closable = false;
        self
    }
}

/// Options for style compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Collapse whitespace in the output.
    #[serde(default)]
    pub minify: bool,
    /// `$name` variables substituted in the source.
    #[serde(default)]
    pub variables: IndexMap<String, String>,
}

impl CompileOptions {
    /// Set a variable.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Enable minification.
    pub fn minified(mut self) -> Self {
        self.minify = true;
        self
    }
}

/// Output of style compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledStyle {
    /// Compiled CSS text.
    pub css: String,
}

/// A loaded piece of content returned by the extension directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionHandle {
    /// Content category.
    pub kind: ContentKind,
    /// Identity of the current load.
    pub identity: ExtensionIdentity,
    /// Value the content exports to other extensions.
    #[serde(default)]
    pub bridge: Value,
}

/// Id of an event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// Callback invoked with the payload of an emitted event.
pub type EventCallback = Arc<dyn Fn(&Value) + Send + Sync>;
