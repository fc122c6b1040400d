//! Typed configuration.
//!
//! Every recognized option is listed here with its default. Sections missing
//! from the configuration file fall back to those defaults.

use crate::error::{ChatkeepError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Inserts between automatic vector store flushes.
pub const DEFAULT_FLUSH_INTERVAL: usize = 10;

/// Root configuration (`config.toml`).
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ChatkeepConfig {
    pub storage: StorageConfig,
    pub autosave: AutosaveConfig,
    pub memory: MemoryConfig,
}

/// Where session files live.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Session directory; the platform data directory when unset
    pub save_dir: Option<PathBuf>,
}

/// Exit-time autosave behavior.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Save the active session on exit (default: true)
    pub enabled: bool,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Vector memory store settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MemoryConfig {
    /// Vector store file; the platform data directory when unset
    pub store_file: Option<PathBuf>,
    /// Flush the store to disk after this many inserts (default: 10)
    pub flush_interval: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            store_file: None,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl ChatkeepConfig {
    /// Parses and validates a TOML configuration document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ChatkeepConfig =
            toml::from_str(content).map_err(|e| ChatkeepError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values no component can work with.
    pub fn validate(&self) -> Result<()> {
        if self.memory.flush_interval == 0 {
            return Err(ChatkeepError::config(
                "memory.flush_interval must be at least 1",
            ));
        }
        Ok(())
    }
}
