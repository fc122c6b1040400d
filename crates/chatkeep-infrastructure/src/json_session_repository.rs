//! Directory-of-JSON-files SessionRepository implementation.

use crate::storage::write_atomic;
use async_trait::async_trait;
use chatkeep_core::error::{ChatkeepError, Result};
use chatkeep_core::session::naming::{EXPORT_TIMESTAMP_KEY, parse_backup_file_name};
use chatkeep_core::session::{
    BackupSummary, Session, SessionRepository, SessionSummary, sanitize_session_name,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

const BACKUP_DIR: &str = "backups";

/// Session repository backed by one JSON file per session.
///
/// Directory structure:
/// ```text
/// save_dir/
/// ├── my-session.json
/// ├── auto_save_1700000000.json
/// ├── my-session_export_1700000100.md
/// └── backups/
///     └── my-session_backup_1700000200.json
/// ```
pub struct JsonSessionRepository {
    save_dir: PathBuf,
}

/// A candidate session file found while scanning the save directory.
struct SessionFile {
    name: String,
    path: PathBuf,
    modified_at: DateTime<Utc>,
}

impl JsonSessionRepository {
    /// Creates a repository rooted at `save_dir`, creating the directory.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created.
    pub async fn new(save_dir: impl AsRef<Path>) -> Result<Self> {
        let save_dir = save_dir.as_ref().to_path_buf();
        fs::create_dir_all(&save_dir).await?;
        Ok(Self { save_dir })
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.save_dir.join(BACKUP_DIR)
    }

    fn session_path(&self, name: &str) -> PathBuf {
        self.save_dir.join(format!("{}.json", name))
    }

    /// Finds the file for `name`, trying the exact name before the sanitized one.
    async fn resolve(&self, name: &str) -> Result<PathBuf> {
        let exact = self.session_path(name);
        if is_plain_name(name) && fs::try_exists(&exact).await? {
            return Ok(exact);
        }

        let sanitized = self.session_path(&sanitize_session_name(name));
        if fs::try_exists(&sanitized).await? {
            return Ok(sanitized);
        }

        Err(ChatkeepError::not_found("session", name))
    }

    /// Lists session files in the save directory, newest first.
    ///
    /// Backups live in their own directory and anything that is not `*.json`
    /// is skipped here. JSON exports are told apart by content, see
    /// [`read_listed_session`].
    async fn scan(&self) -> Result<Vec<SessionFile>> {
        let mut entries = match fs::read_dir(&self.save_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            let modified_at = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

            files.push(SessionFile {
                name: name.to_string(),
                path,
                modified_at,
            });
        }

        files.sort_by(|a, b| {
            b.modified_at
                .cmp(&a.modified_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(files)
    }
}

/// Reads a JSON document. Content that is not UTF-8 JSON is `InvalidFormat`.
async fn read_document(path: &Path, entity_type: &'static str, name: &str) -> Result<Value> {
    let source_name = path.display().to_string();
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ChatkeepError::not_found(entity_type, name));
        }
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            return Err(ChatkeepError::invalid_format(source_name, e.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content)
        .map_err(|e| ChatkeepError::invalid_format(source_name, e.to_string()))
}

/// Reads and parses a session file.
async fn read_session(path: &Path, entity_type: &'static str, name: &str) -> Result<Session> {
    let document = read_document(path, entity_type, name).await?;
    Session::from_document(document, &path.display().to_string())
}

/// Reads a file found by a directory scan; `Ok(None)` for JSON exports.
async fn read_listed_session(file: &SessionFile) -> Result<Option<Session>> {
    let document = read_document(&file.path, "session", &file.name).await?;
    if document.get(EXPORT_TIMESTAMP_KEY).is_some() {
        tracing::debug!("Skipping export file {}", file.path.display());
        return Ok(None);
    }
    Session::from_document(document, &file.path.display().to_string()).map(Some)
}

/// True for names that cannot escape the directory they are joined to.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

#[async_trait]
impl SessionRepository for JsonSessionRepository {
    async fn save(&self, name: &str, session: &Session) -> Result<PathBuf> {
        if !is_plain_name(name) {
            return Err(ChatkeepError::validation(format!(
                "invalid session file name '{}'",
                name
            )));
        }
        let path = self.session_path(name);
        let json = serde_json::to_string_pretty(session)?;
        write_atomic(&path, json.as_bytes()).await?;
        Ok(path)
    }

    async fn load(&self, name: &str) -> Result<Session> {
        let path = self.resolve(name).await?;
        read_session(&path, "session", name).await
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let path = self.resolve(name).await?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ChatkeepError::not_found("session", name))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<SessionSummary>> {
        let mut summaries = Vec::new();
        for file in self.scan().await? {
            match read_listed_session(&file).await {
                Ok(None) => {}
                Ok(Some(session)) => {
                    let metadata = session.metadata();
                    summaries.push(SessionSummary {
                        name: file.name,
                        original_name: metadata.original_name.clone(),
                        message_count: session.len(),
                        created_at: metadata.created_at,
                        last_modified: metadata.last_modified,
                        modified_at: file.modified_at,
                    });
                }
                Err(e) => {
                    tracing::warn!("Skipping session file {}: {}", file.path.display(), e);
                }
            }
        }
        Ok(summaries)
    }

    async fn last_modified(&self) -> Result<Option<String>> {
        for file in self.scan().await? {
            match read_listed_session(&file).await {
                Ok(None) => {}
                Ok(Some(_)) => return Ok(Some(file.name)),
                Err(e) => {
                    tracing::debug!("Ignoring {} for latest session: {}", file.path.display(), e);
                }
            }
        }
        Ok(None)
    }

    async fn save_backup(&self, file_name: &str, session: &Session) -> Result<PathBuf> {
        if !is_plain_name(file_name) {
            return Err(ChatkeepError::validation(format!(
                "invalid backup file name '{}'",
                file_name
            )));
        }
        let path = self.backup_dir().join(file_name);
        let json = serde_json::to_string_pretty(session)?;
        write_atomic(&path, json.as_bytes()).await?;
        Ok(path)
    }

    async fn list_backups(&self) -> Result<Vec<BackupSummary>> {
        let mut entries = match fs::read_dir(self.backup_dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut backups = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let parsed = parse_backup_file_name(&file_name)
                .and_then(|(name, ts)| Some((name, Utc.timestamp_opt(ts, 0).single()?)));
            match parsed {
                Some((session_name, created_at)) => backups.push(BackupSummary {
                    file_name,
                    session_name,
                    created_at,
                }),
                None => tracing::debug!("Skipping non-backup file {}", file_name),
            }
        }

        backups.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        Ok(backups)
    }

    async fn load_backup(&self, file_name: &str) -> Result<Session> {
        if !is_plain_name(file_name) {
            return Err(ChatkeepError::not_found("backup", file_name));
        }
        read_session(&self.backup_dir().join(file_name), "backup", file_name).await
    }

    async fn write_export(&self, file_name: &str, contents: &str) -> Result<PathBuf> {
        let path = Path::new(file_name);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.save_dir.join(path)
        };
        write_atomic(&path, contents.as_bytes()).await?;
        Ok(path)
    }
}
