//! Platform path resolution for chatkeep files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/chatkeep/          # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/chatkeep/     # Data directory
//! ├── sessions/                # Session files (default save_dir)
//! │   └── backups/
//! └── memory/
//!     └── vectors.json         # Vector memory store
//! ```

use chatkeep_core::config::ChatkeepConfig;
use chatkeep_core::error::{ChatkeepError, Result};
use std::path::PathBuf;

const APP_NAME: &str = "chatkeep";

/// Unified path management for chatkeep.
pub struct ChatkeepPaths;

impl ChatkeepPaths {
    /// Returns the chatkeep configuration directory (e.g., `~/.config/chatkeep/`).
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or_else(|| ChatkeepError::config("Cannot find config directory"))
    }

    /// Returns the chatkeep data directory (e.g., `~/.local/share/chatkeep/`).
    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or_else(|| ChatkeepError::config("Cannot find data directory"))
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn default_sessions_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("sessions"))
    }

    pub fn default_memory_file() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("memory").join("vectors.json"))
    }

    /// Session directory for `config`, falling back to the platform default.
    pub fn sessions_dir(config: &ChatkeepConfig) -> Result<PathBuf> {
        match &config.storage.save_dir {
            Some(dir) => Ok(dir.clone()),
            None => Self::default_sessions_dir(),
        }
    }

    /// Vector store file for `config`, falling back to the platform default.
    pub fn memory_file(config: &ChatkeepConfig) -> Result<PathBuf> {
        match &config.memory.store_file {
            Some(file) => Ok(file.clone()),
            None => Self::default_memory_file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_paths_win() {
        let mut config = ChatkeepConfig::default();
        config.storage.save_dir = Some(PathBuf::from("/srv/chats"));
        config.memory.store_file = Some(PathBuf::from("/srv/memory.json"));

        assert_eq!(
            ChatkeepPaths::sessions_dir(&config).unwrap(),
            PathBuf::from("/srv/chats")
        );
        assert_eq!(
            ChatkeepPaths::memory_file(&config).unwrap(),
            PathBuf::from("/srv/memory.json")
        );
    }

    #[test]
    fn test_defaults_live_under_app_directory() {
        // Only meaningful where the platform exposes a data directory
        if let Ok(dir) = ChatkeepPaths::default_sessions_dir() {
            assert!(dir.ends_with("chatkeep/sessions"));
        }
        if let Ok(file) = ChatkeepPaths::config_file() {
            assert!(file.ends_with("chatkeep/config.toml"));
        }
    }
}
