//! Session repository trait.
//!
//! Defines the interface for session persistence operations.

use super::model::Session;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// A stored session as seen by a directory listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Name the session is stored under (file stem)
    pub name: String,
    /// Original, unsanitized name if one was recorded
    pub original_name: Option<String>,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    /// Modification time of the backing file
    pub modified_at: DateTime<Utc>,
}

/// A backup snapshot as seen by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSummary {
    pub file_name: String,
    pub session_name: String,
    /// Instant encoded in the file name
    pub created_at: DateTime<Utc>,
}

/// An abstract repository for managing session persistence.
///
/// This trait decouples [`SessionStore`](super::SessionStore) from the
/// storage mechanism. Names passed to `save` are already sanitized; names
/// passed to `load` and `delete` are tried verbatim first and sanitized second.
///
/// # Implementation Notes
///
/// Implementations should handle:
/// - Atomic writes (a failed save must not corrupt an existing file)
/// - Per-item recovery in `list` and `last_modified` (skip bad files)
/// - `NotFound` for single-target operations on absent names
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Writes a session under `name`, replacing any previous content.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Location the session was written to
    /// - `Err(_)`: `Io` on filesystem failure
    async fn save(&self, name: &str, session: &Session) -> Result<PathBuf>;

    /// Reads the session stored under `name`.
    ///
    /// # Returns
    ///
    /// - `Ok(Session)`: Session found and well-formed
    /// - `Err(_)`: `NotFound` when absent, `InvalidFormat` when malformed
    async fn load(&self, name: &str) -> Result<Session>;

    /// Removes the session stored under `name`.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Session deleted
    /// - `Err(_)`: `NotFound` when absent, `Io` on filesystem failure
    async fn delete(&self, name: &str) -> Result<()>;

    /// Lists stored sessions, newest file first, skipping unreadable ones.
    async fn list(&self) -> Result<Vec<SessionSummary>>;

    /// Returns the name of the most recently modified valid session.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(name))`: Newest session with a valid message array
    /// - `Ok(None)`: No valid session exists
    async fn last_modified(&self) -> Result<Option<String>>;

    /// Writes a backup snapshot named `file_name`, never touching the primary file.
    async fn save_backup(&self, file_name: &str, session: &Session) -> Result<PathBuf>;

    /// Lists backup snapshots, newest first.
    async fn list_backups(&self) -> Result<Vec<BackupSummary>>;

    /// Reads the backup snapshot named `file_name`.
    async fn load_backup(&self, file_name: &str) -> Result<Session>;

    /// Writes an export file and returns where it landed.
    ///
    /// Relative file names are resolved against the save directory.
    async fn write_export(&self, file_name: &str, contents: &str) -> Result<PathBuf>;
}
