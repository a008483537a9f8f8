//! Ledger configuration loading and management.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use persona_core::{Bytes32, RegistryConfig};

/// Full configuration for a persistent Persona ledger.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LedgerConfig {
    /// Parameters the registry is deployed with when the store is empty.
    /// Ignored once a snapshot exists.
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the RocksDB snapshot store lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the `world`, `events` and `meta` column families.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./persona-ledger")
}

/// Output format of ledger events and transaction traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Fallback filter directive when `RUST_LOG` is unset, e.g. `info` or
    /// `persona_protocol=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

impl LedgerConfig {
    /// Load config from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading ledger config {}", path.display()))?;
        let config: LedgerConfig = toml::from_str(&contents)
            .with_context(|| format!("parsing ledger config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save the config as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject settings the ledger could not deploy or open with.
    pub fn validate(&self) -> anyhow::Result<()> {
        Bytes32::from_text(&self.registry.name)
            .with_context(|| format!("registry name {:?}", self.registry.name))?;
        if self.storage.data_dir.as_os_str().is_empty() {
            anyhow::bail!("storage.data_dir must not be empty");
        }
        Ok(())
    }
}
