//! Single-file JSON VectorRepository implementation.

use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use chatkeep_core::error::Result;
use chatkeep_core::memory::{VectorRepository, VectorStoreDocument};
use std::path::{Path, PathBuf};

/// Vector repository storing the whole store in one JSON document.
pub struct JsonVectorRepository {
    file: AtomicJsonFile<VectorStoreDocument>,
}

impl JsonVectorRepository {
    /// Creates a repository for `path`. The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[async_trait]
impl VectorRepository for JsonVectorRepository {
    async fn load(&self) -> Result<Option<VectorStoreDocument>> {
        self.file.load().await
    }

    async fn save(&self, document: &VectorStoreDocument) -> Result<()> {
        self.file.save(document).await?;
        tracing::debug!(
            "Persisted {} vectors to {}",
            document.count,
            self.path().display()
        );
        Ok(())
    }
}
