//! Configuration for itrack
//!
//! Stored as TOML, by default in `<config_dir>/itrack/config.toml`.

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "itrack";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_STORAGE_FILE: &str = "issues.json";

/// itrack configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage settings
    pub storage: StorageConfig,

    /// Display settings
    pub display: DisplayConfig,
}

/// Where issues are persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the issues file. Relative paths resolve against the working directory.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORAGE_FILE),
        }
    }
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Use colors in output
    pub colors: bool,

    /// Date format for display
    pub date_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            colors: true,
            date_format: "%Y-%m-%d %H:%M".to_string(),
        }
    }
}

impl Config {
    /// Default location of the config file, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load config from a TOML file
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))?;
        config
            .validate()
            .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Check values that TOML parsing alone cannot reject
    pub fn validate(&self) -> std::result::Result<(), String> {
        let format = &self.display.date_format;
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(format!("invalid display.date_format '{}'", format));
        }
        Ok(())
    }

    /// Write the commented default config to `path` unless a file is already there
    ///
    /// Returns `false` when an existing file was left alone.
    pub fn init_file(path: &Path) -> crate::Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| crate::Error::Config(format!("{}: {}", parent.display(), e)))?;
        }
        std::fs::write(path, Self::default_with_comments())
            .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(true)
    }

    /// Pick the issues file: an explicit override wins over the configured path
    pub fn storage_path(&self, override_path: Option<&Path>) -> PathBuf {
        override_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.storage.path.clone())
    }

    /// Generate a default config file with comments
    pub fn default_with_comments() -> String {
        r#"# itrack configuration

[storage]
# Issues file. Relative paths resolve against the working directory.
# Overridden by --file or ITRACK_FILE.
path = "issues.json"

[display]
# Use colors in output
colors = true

# Date format for display (strftime format)
date_format = "%Y-%m-%d %H:%M"
"#
        .to_string()
    }
}
