// Mock SessionRepository shared by the store and autosave tests.

use super::model::Session;
use super::naming::{parse_backup_file_name, sanitize_session_name};
use super::repository::{BackupSummary, SessionRepository, SessionSummary};
use crate::error::{ChatkeepError, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Default)]
pub(crate) struct MockSessionRepository {
    pub sessions: Mutex<HashMap<String, Session>>,
    pub backups: Mutex<HashMap<String, Session>>,
    pub exports: Mutex<HashMap<String, String>>,
    pub save_calls: AtomicUsize,
    pub fail_writes: AtomicBool,
}

impl MockSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ChatkeepError::io("disk full"));
        }
        Ok(())
    }

    fn resolve(&self, name: &str) -> Option<String> {
        let sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(name) {
            return Some(name.to_string());
        }
        let sanitized = sanitize_session_name(name);
        sessions.contains_key(&sanitized).then_some(sanitized)
    }
}

#[async_trait]
impl SessionRepository for MockSessionRepository {
    async fn save(&self, name: &str, session: &Session) -> Result<PathBuf> {
        self.check_writable()?;
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .unwrap()
            .insert(name.to_string(), session.clone());
        Ok(PathBuf::from(format!("{}.json", name)))
    }

    async fn load(&self, name: &str) -> Result<Session> {
        let key = self
            .resolve(name)
            .ok_or_else(|| ChatkeepError::not_found("session", name))?;
        Ok(self.sessions.lock().unwrap()[&key].clone())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let key = self
            .resolve(name)
            .ok_or_else(|| ChatkeepError::not_found("session", name))?;
        self.sessions.lock().unwrap().remove(&key);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionSummary>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .iter()
            .map(|(name, session)| SessionSummary {
                name: name.clone(),
                original_name: session.metadata().original_name.clone(),
                message_count: session.len(),
                created_at: session.metadata().created_at,
                last_modified: session.metadata().last_modified,
                modified_at: session.metadata().last_modified,
            })
            .collect())
    }

    async fn last_modified(&self) -> Result<Option<String>> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .iter()
            .max_by_key(|(_, s)| s.metadata().last_modified)
            .map(|(name, _)| name.clone()))
    }

    async fn save_backup(&self, file_name: &str, session: &Session) -> Result<PathBuf> {
        self.check_writable()?;
        self.backups
            .lock()
            .unwrap()
            .insert(file_name.to_string(), session.clone());
        Ok(PathBuf::from("backups").join(file_name))
    }

    async fn list_backups(&self) -> Result<Vec<BackupSummary>> {
        let backups = self.backups.lock().unwrap();
        Ok(backups
            .keys()
            .filter_map(|file_name| {
                let (session_name, ts) = parse_backup_file_name(file_name)?;
                Some(BackupSummary {
                    file_name: file_name.clone(),
                    session_name,
                    created_at: Utc.timestamp_opt(ts, 0).single()?,
                })
            })
            .collect())
    }

    async fn load_backup(&self, file_name: &str) -> Result<Session> {
        self.backups
            .lock()
            .unwrap()
            .get(file_name)
            .cloned()
            .ok_or_else(|| ChatkeepError::not_found("backup", file_name))
    }

    async fn write_export(&self, file_name: &str, contents: &str) -> Result<PathBuf> {
        self.check_writable()?;
        self.exports
            .lock()
            .unwrap()
            .insert(file_name.to_string(), contents.to_string());
        Ok(PathBuf::from(file_name))
    }
}
