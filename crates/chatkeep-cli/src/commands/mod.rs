pub mod config;
pub mod memory;
pub mod record;
pub mod sessions;

use anyhow::{Context, Result};
use chatkeep_core::config::ChatkeepConfig;
use chatkeep_core::memory::VectorMemoryStore;
use chatkeep_core::session::SessionStore;
use chatkeep_infrastructure::{
    ChatkeepPaths, ConfigService, JsonSessionRepository, JsonVectorRepository,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Resolved configuration shared by every command.
pub struct AppContext {
    pub config_service: ConfigService,
    pub config: ChatkeepConfig,
    pub save_dir: PathBuf,
    pub memory_file: PathBuf,
}

impl AppContext {
    /// Loads the configuration file and applies command-line overrides.
    pub async fn load(config_path: Option<PathBuf>, save_dir: Option<PathBuf>) -> Result<Self> {
        let config_service = match config_path {
            Some(path) => ConfigService::new(path),
            None => ConfigService::default_location()
                .context("Failed to determine configuration path")?,
        };
        let mut config = config_service.load().await.with_context(|| {
            format!(
                "Failed to load configuration from {}",
                config_service.path().display()
            )
        })?;

        if let Some(dir) = save_dir {
            config.storage.save_dir = Some(dir);
        }

        let save_dir = ChatkeepPaths::sessions_dir(&config)
            .context("Failed to determine session directory")?;
        let memory_file = ChatkeepPaths::memory_file(&config)
            .context("Failed to determine vector store path")?;
        tracing::debug!(
            "Using sessions in {} and vectors in {}",
            save_dir.display(),
            memory_file.display()
        );

        Ok(Self {
            config_service,
            config,
            save_dir,
            memory_file,
        })
    }

    pub async fn session_store(&self) -> Result<SessionStore> {
        let repository = JsonSessionRepository::new(&self.save_dir)
            .await
            .with_context(|| format!("Failed to open {}", self.save_dir.display()))?;
        Ok(SessionStore::new(Arc::new(repository)))
    }

    pub fn vector_store(&self) -> VectorMemoryStore {
        let repository = JsonVectorRepository::new(self.memory_file.clone());
        VectorMemoryStore::new(Arc::new(repository), &self.config.memory)
    }
}
