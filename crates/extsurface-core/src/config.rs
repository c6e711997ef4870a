//! Surface configuration.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{SurfaceError, SurfaceResult};

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "extsurface.toml";

/// Configuration shared by every extension surface of a host.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct SurfaceConfig {
    /// Prefix of namespaced style ids (`{prefix}-{extension}-{id}`).
    #[builder(default = "default_style_prefix()")]
    pub style_prefix: String,

    /// Local style id used when none is given.
    #[builder(default = "default_style_id()")]
    pub default_style_id: String,

    /// Menu category used for bound settings entries.
    #[builder(default = "default_menu_category()")]
    pub menu_category: String,

    /// Whether teardown force-closes modals.
    #[builder(default = "true")]
    pub force_close_on_teardown: bool,

    /// Timeout for waiting on other extensions, in milliseconds.
    #[builder(default = "10_000")]
    pub wait_timeout_ms: u64,

    /// Default log filter for the command line tool.
    #[builder(default = "default_log_filter()")]
    pub log_filter: String,
}

fn default_style_prefix() -> String {
    "plugin".to_string()
}

fn default_style_id() -> String {
    "default".to_string()
}

fn default_menu_category() -> String {
    "Plugins".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl SurfaceConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let required = [
            ("style_prefix", &self.style_prefix),
            ("default_style_id", &self.default_style_id),
            ("menu_category", &self.menu_category),
        ];
        for (name, value) in required {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(format!("{name} cannot be empty"));
            }
        }
        if self.wait_timeout_ms == Some(0) {
            return Err("wait_timeout_ms must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            style_prefix: default_style_prefix(),
            default_style_id: default_style_id(),
            menu_category: default_menu_category(),
            force_close_on_teardown: true,
            wait_timeout_ms: 10_000,
            log_filter: default_log_filter(),
        }
    }
}

impl SurfaceConfig {
    /// Create a new config builder.
    pub fn builder() -> SurfaceConfigBuilder {
        SurfaceConfigBuilder::default()
    }

    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("extsurface")
            .join(CONFIG_FILE_NAME)
    }

    /// Load configuration from a TOML file, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> SurfaceResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> SurfaceResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| SurfaceError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate a config that did not go through the builder.
    pub fn validate(&self) -> SurfaceResult<()> {
        SurfaceConfigBuilder::default()
            .style_prefix(self.style_prefix.clone())
            .default_style_id(self.default_style_id.clone())
            .menu_category(self.menu_category.clone())
            .wait_timeout_ms(self.wait_timeout_ms)
            .validate()
            .map_err(|message| SurfaceError::Config { message })
    }

    /// Namespaced host style id for an extension's local style id.
    pub fn style_id(&self, extension: &str, local_id: &str) -> String {
        format!("{}-{}-{}", self.style_prefix, extension, local_id)
    }
}
