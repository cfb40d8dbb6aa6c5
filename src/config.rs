//! Plugin configuration, read from YAML.
//!
//! ```yaml
//! game: rfactor1
//! cache_folder: /games/rFactor/Plugins/pitboard/cache
//! mod_name: F1CTDP06
//! log_filter: info
//! editor:
//!   driver_name: Jane Doe
//! ```
//!
//! Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::cache::CacheLocation;
use crate::game::GameVersion;
use crate::presets::EditorPresets;
use crate::TelemetryError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PluginConfig {
    /// Selects the record formats
    pub game: GameVersion,
    /// Root of the data cache; no cache when absent
    pub cache_folder: Option<PathBuf>,
    /// Name of the running mod, used to separate cache files
    pub mod_name: String,
    /// `tracing` filter directive used when `RUST_LOG` is not set
    pub log_filter: String,
    pub editor: EditorPresets,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            game: GameVersion::default(),
            cache_folder: None,
            mod_name: "default".to_string(),
            log_filter: "info".to_string(),
            editor: EditorPresets::default(),
        }
    }
}

impl PluginConfig {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml_ng::from_str(yaml).context("invalid plugin configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// The mod name becomes a folder below the cache root.
    pub fn validate(&self) -> crate::Result<()> {
        if self.mod_name.trim().is_empty() {
            return Err(TelemetryError::config("mod_name must not be empty"));
        }
        if self.mod_name.contains(['/', '\\']) || self.mod_name == ".." {
            return Err(TelemetryError::config(format!("mod_name {:?} is not a folder name", self.mod_name)));
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration file {}", path.display()))?;
        Self::from_yaml(&yaml).with_context(|| format!("in {}", path.display()))
    }

    /// Where cache files go, if caching is enabled.
    pub fn cache_location(&self) -> Option<CacheLocation> {
        self.cache_folder.as_ref().map(|folder| CacheLocation::new(folder, self.mod_name.clone()))
    }
}
