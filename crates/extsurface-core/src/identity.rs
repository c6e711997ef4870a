//! Extension identity types.

use std::fmt;
use std::path::PathBuf;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Stable identifier of an extension, used as the owner of patches and resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionId(CompactString);

impl ExtensionId {
    /// Create a new extension id.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExtensionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ExtensionId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// A resolved view of a loaded extension.
///
/// Identities are resolved from the extension directory at call time and are
/// never cached by a surface: a reload produces a new identity with a higher
/// `generation` for the same path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionIdentity {
    /// Stable id (owner key).
    pub id: ExtensionId,

    /// Human readable name used for log attribution.
    pub name: CompactString,

    /// Path the extension was loaded from.
    pub path: PathBuf,

    /// Load generation, incremented on every reload.
    #[serde(default)]
    pub generation: u64,
}

impl ExtensionIdentity {
    /// Create a first-generation identity.
    pub fn new(
        id: impl Into<ExtensionId>,
        name: impl Into<CompactString>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            generation: 0,
        }
    }

    /// Return the identity of the next load of the same extension.
    pub fn reloaded(&self) -> Self {
        Self {
            generation: self.generation + 1,
            ..self.clone()
        }
    }
}

/// Categories of content known to the extension directory.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Code extensions with a capability surface.
    #[default]
    Plugin,

    /// Style-only content.
    Theme,

    /// Shared library modules importable by plugins.
    ExtModule,
}
