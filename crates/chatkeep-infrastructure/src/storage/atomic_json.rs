//! Atomic JSON file operations.
//!
//! Writes go to a hidden temporary file in the target directory, are synced to
//! disk, and then renamed over the target, so readers see either the old or the
//! new content, never a partial write.

use chatkeep_core::error::{ChatkeepError, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

/// A handle to a JSON file that is always replaced atomically.
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err(_)`: `Io` if the file cannot be read, `InvalidFormat` if it
    ///   does not parse as `T`
    pub async fn load(&self) -> Result<Option<T>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let data = serde_json::from_str(&content).map_err(|e| {
            ChatkeepError::invalid_format(self.path.display().to_string(), e.to_string())
        })?;
        Ok(Some(data))
    }

    /// Serializes `data` as pretty-printed JSON and replaces the file.
    pub async fn save(&self, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        write_atomic(&self.path, json.as_bytes()).await
    }
}

/// Replaces `path` with `contents` via tmp file + fsync + rename.
///
/// Missing parent directories are created. On failure the previous file, if
/// any, is left untouched.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| ChatkeepError::io(format!("{} has no parent directory", path.display())))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| ChatkeepError::io(format!("{} has no file name", path.display())))?;

    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent).await?;
    }

    let tmp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));
    if let Err(e) = write_and_sync(&tmp_path, contents).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e);
    }

    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }

    tracing::debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

async fn write_and_sync(path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = File::create(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestDocument {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicJsonFile::<TestDocument>::new(temp_dir.path().join("doc.json"));

        let doc = TestDocument {
            name: "test".to_string(),
            count: 42,
        };
        file.save(&doc).await.unwrap();

        assert_eq!(file.load().await.unwrap(), Some(doc));
    }

    #[tokio::test]
    async fn test_load_missing_or_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");
        let file = AtomicJsonFile::<TestDocument>::new(path.clone());

        assert!(file.load().await.unwrap().is_none());

        std::fs::write(&path, "  \n").unwrap();
        assert!(file.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");
        std::fs::write(&path, "{\"name\": ").unwrap();

        let err = AtomicJsonFile::<TestDocument>::new(path)
            .load()
            .await
            .unwrap_err();
        assert!(err.is_invalid_format());
    }

    #[tokio::test]
    async fn test_atomic_write_creates_parents_and_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("out.txt");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!temp_dir.path().join("nested").join(".out.txt.tmp").exists());
    }
}
