//! The active conversation and its persistence operations.

use super::analytics::ConversationAnalytics;
use super::export::{ExportFormat, render_export};
use super::message::{ConversationMessage, MessageRole};
use super::model::{Session, SessionMetadata};
use super::naming::{UNNAMED_SESSION, backup_file_name, export_file_name, sanitize_session_name};
use super::repository::{BackupSummary, SessionRepository, SessionSummary};
use super::search::{SearchOptions, search_messages};
use crate::error::{ChatkeepError, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Persistence state of the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveState {
    /// In-memory session matches what was last saved or loaded.
    Idle,
    /// Messages were added since the last save.
    Dirty,
    /// A save is in flight.
    Saving,
}

/// Owns the active conversation and persists it through a [`SessionRepository`].
///
/// `SessionStore` is responsible for:
/// - Appending messages to the active session
/// - Saving, loading, backing up and exporting it
/// - Searching and summarizing its history
/// - Listing and deleting stored sessions
///
/// Single-target operations leave the in-memory session untouched when they
/// fail.
pub struct SessionStore {
    session: Session,
    repository: Arc<dyn SessionRepository>,
    /// Sanitized name of the last successful save or load
    session_name: Option<String>,
    state: SaveState,
}

impl SessionStore {
    /// Creates a store holding a fresh, empty session.
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self {
            session: Session::new(),
            repository,
            session_name: None,
            state: SaveState::Idle,
        }
    }

    /// Appends a message and marks the session dirty.
    pub fn add_message(
        &mut self,
        role: MessageRole,
        content: impl Into<String>,
    ) -> &ConversationMessage {
        self.session.push(ConversationMessage::new(role, content));
        self.state = SaveState::Dirty;
        &self.session.messages()[self.session.len() - 1]
    }

    /// Saves the session under `name`.
    ///
    /// The name is sanitized before it reaches storage; the unsanitized form is
    /// kept in the metadata as `originalName`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty name and `Io` when the write fails.
    /// On failure the session and its dirty state are unchanged.
    pub async fn save(&mut self, name: &str) -> Result<PathBuf> {
        let original = require_name(name)?;
        let sanitized = sanitize_session_name(original);

        let previous = self.state;
        self.state = SaveState::Saving;

        let mut snapshot = self.session.clone();
        snapshot.mark_saved(&sanitized, original, Utc::now());

        match self.repository.save(&sanitized, &snapshot).await {
            Ok(path) => {
                tracing::info!(
                    "Saved session '{}' ({} messages) to {:?}",
                    sanitized,
                    snapshot.len(),
                    path
                );
                self.session = snapshot;
                self.session_name = Some(sanitized);
                self.state = SaveState::Idle;
                Ok(path)
            }
            Err(e) => {
                tracing::warn!("Failed to save session '{}': {}", sanitized, e);
                self.state = previous;
                Err(e)
            }
        }
    }

    /// Replaces the active session with the one stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `InvalidFormat`; the active session is kept as is.
    pub async fn load(&mut self, name: &str) -> Result<()> {
        require_name(name)?;
        let session = self.repository.load(name).await?;
        let session_name = session
            .metadata()
            .session_name
            .clone()
            .unwrap_or_else(|| sanitize_session_name(name));

        tracing::info!(
            "Loaded session '{}' ({} messages)",
            session_name,
            session.len()
        );
        self.session = session;
        self.session_name = Some(session_name);
        self.state = SaveState::Idle;
        Ok(())
    }

    /// Resets to a fresh, empty, unnamed session.
    pub fn clear(&mut self) {
        self.session = Session::new();
        self.session_name = None;
        self.state = SaveState::Idle;
    }

    /// Messages matching `query`, in history order.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<&ConversationMessage> {
        search_messages(self.session.messages(), query, options)
    }

    pub fn analytics(&self) -> ConversationAnalytics {
        ConversationAnalytics::from_messages(self.session.messages())
    }

    /// Writes the session in `format` and returns the file path.
    ///
    /// Without `file_name`, the file is named `<name>_export_<unixTime>.<ext>`.
    pub async fn export(&self, format: ExportFormat, file_name: Option<&str>) -> Result<PathBuf> {
        let now = Utc::now();
        let contents = render_export(&self.session, format, now)?;
        let file_name = match file_name {
            Some(name) => name.to_string(),
            None => export_file_name(self.name_or_default(), now.timestamp(), format.extension()),
        };

        let path = self.repository.write_export(&file_name, &contents).await?;
        tracing::info!("Exported session as {} to {:?}", format, path);
        Ok(path)
    }

    /// Writes a timestamped snapshot next to, never over, the primary file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(path))`: Backup written
    /// - `Ok(None)`: Nothing to back up (empty history)
    pub async fn create_backup(&self) -> Result<Option<PathBuf>> {
        if self.session.is_empty() {
            tracing::info!("No conversation history to back up");
            return Ok(None);
        }

        let file_name = backup_file_name(self.name_or_default(), Utc::now().timestamp());
        let path = self.repository.save_backup(&file_name, &self.session).await?;
        tracing::info!("Created backup {:?}", path);
        Ok(Some(path))
    }

    pub async fn list_backups(&self) -> Result<Vec<BackupSummary>> {
        self.repository.list_backups().await
    }

    /// Replaces the active session with a backup snapshot.
    ///
    /// The restored session keeps the name it was backed up from and is
    /// marked dirty, so the next save overwrites the primary file.
    pub async fn restore_backup(&mut self, file_name: &str) -> Result<()> {
        let session = self.repository.load_backup(file_name).await?;
        tracing::info!(
            "Restored backup '{}' ({} messages)",
            file_name,
            session.len()
        );
        self.session_name = session.metadata().session_name.clone();
        self.session = session;
        self.state = SaveState::Dirty;
        Ok(())
    }

    /// Deletes a stored session. The active session is not affected.
    pub async fn delete_session(&self, name: &str) -> Result<()> {
        require_name(name)?;
        self.repository.delete(name).await?;
        tracing::info!("Deleted session '{}'", name);
        Ok(())
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        self.repository.list().await
    }

    pub async fn last_modified_session(&self) -> Result<Option<String>> {
        self.repository.last_modified().await
    }

    fn name_or_default(&self) -> &str {
        self.session_name.as_deref().unwrap_or(UNNAMED_SESSION)
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn history(&self) -> &[ConversationMessage] {
        self.session.messages()
    }

    pub fn metadata(&self) -> &SessionMetadata {
        self.session.metadata()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_name(&self) -> Option<&str> {
        self.session_name.as_deref()
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == SaveState::Dirty
    }

    pub fn is_empty(&self) -> bool {
        self.session.is_empty()
    }

    /// True when the session has changes that no save has captured yet.
    pub fn needs_save(&self) -> bool {
        self.is_dirty() || self.session_name.is_none()
    }
}

fn require_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ChatkeepError::validation("session name must not be empty"));
    }
    Ok(name)
}
