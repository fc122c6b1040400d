//! Configuration service implementation.
//!
//! Loads the root configuration from `config.toml` (by default
//! `~/.config/chatkeep/config.toml`).

use crate::paths::ChatkeepPaths;
use crate::storage::write_atomic;
use chatkeep_core::config::ChatkeepConfig;
use chatkeep_core::error::{ChatkeepError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Reads and writes the TOML configuration file.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a ConfigService for the platform config file.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(ChatkeepPaths::config_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the configuration.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file does not parse or holds invalid values,
    /// `Io` if it cannot be read.
    pub async fn load(&self) -> Result<ChatkeepConfig> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", self.path.display());
                return Ok(ChatkeepConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        ChatkeepConfig::from_toml_str(&content).map_err(|e| match e {
            ChatkeepError::Config(message) => {
                ChatkeepError::config(format!("{}: {}", self.path.display(), message))
            }
            other => other,
        })
    }

    /// Writes `config` to the file, replacing it atomically.
    pub async fn save(&self, config: &ChatkeepConfig) -> Result<()> {
        config.validate()?;
        let content = toml::to_string_pretty(config)?;
        write_atomic(&self.path, content.as_bytes()).await?;
        tracing::info!("Wrote configuration to {}", self.path.display());
        Ok(())
    }
}
