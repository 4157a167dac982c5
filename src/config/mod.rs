//! Engine settings
//!
//! Settings are built once at startup (from defaults or a TOML file) and shared
//! by reference with every component. Nothing re-reads them afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::ColumnType;

/// Errors that can occur while loading settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Document store backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// Process-local store, lost on exit
    #[default]
    Memory,
    /// One JSON file per column under `storage.path`
    Filesystem,
}

/// Storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackendKind,
    pub path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::Memory,
            path: PathBuf::from("./sot-data"),
        }
    }
}

/// Logging settings (consumed by the CLI subscriber)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Process-wide engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Prefix marking a shared (role-scoped) config set
    pub shared_prefix: String,
    /// Role value that matches every device
    pub wildcard_role: String,
    /// Prefix of cvar tokens, e.g. `_cvar.router_id`
    pub cvar_prefix: String,
    /// Device attributes that must exist before a column is built for a device
    pub required_attributes: BTreeMap<ColumnType, Vec<String>>,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shared_prefix: "_".to_string(),
            wildcard_role: "*".to_string(),
            cvar_prefix: "_cvar.".to_string(),
            required_attributes: BTreeMap::from([(ColumnType::Igp, vec!["iso".to_string()])]),
            storage: StorageSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        settings.check()?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.shared_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "shared_prefix cannot be empty".to_string(),
            ));
        }
        if self.cvar_prefix.is_empty() {
            return Err(ConfigError::Invalid("cvar_prefix cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Whether `set_id` names a shared config set
    pub fn is_shared(&self, set_id: &str) -> bool {
        set_id.starts_with(&self.shared_prefix)
    }

    /// Attributes a device must carry to build `column`
    pub fn required_attributes(&self, column: ColumnType) -> &[String] {
        self.required_attributes
            .get(&column)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
