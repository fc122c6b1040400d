//! Session naming rules shared by the store and the storage backends.

/// Prefix used for sessions named automatically at exit.
pub const AUTO_SAVE_PREFIX: &str = "auto_save_";

/// Marker separating the session name from the timestamp in backup files.
pub const BACKUP_MARKER: &str = "_backup_";

/// Marker separating the session name from the timestamp in export files.
pub const EXPORT_MARKER: &str = "_export_";

/// Top-level key that marks a JSON document as an export rather than a session.
pub const EXPORT_TIMESTAMP_KEY: &str = "exportedAt";

/// Name used for exports and backups of a session that was never saved.
pub const UNNAMED_SESSION: &str = "conversation";

/// Maps a session name to a filesystem-safe identifier.
///
/// Every character outside `[A-Za-z0-9-_]` becomes `_`. The mapping is
/// deterministic and idempotent.
pub fn sanitize_session_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Name for a session saved automatically at `unix_seconds`.
pub fn auto_save_name(unix_seconds: i64) -> String {
    format!("{}{}", AUTO_SAVE_PREFIX, unix_seconds)
}

/// File name of a backup of `name` taken at `unix_seconds`.
pub fn backup_file_name(name: &str, unix_seconds: i64) -> String {
    format!("{}{}{}.json", name, BACKUP_MARKER, unix_seconds)
}

/// Splits a backup file name into the session name and its timestamp.
///
/// Returns `None` for names that do not follow the backup pattern.
pub fn parse_backup_file_name(file_name: &str) -> Option<(String, i64)> {
    let stem = file_name.strip_suffix(".json")?;
    let (name, timestamp) = stem.rsplit_once(BACKUP_MARKER)?;
    if name.is_empty() {
        return None;
    }
    let timestamp = timestamp.parse::<i64>().ok()?;
    Some((name.to_string(), timestamp))
}

/// File name of an export of `name` taken at `unix_seconds`.
pub fn export_file_name(name: &str, unix_seconds: i64, extension: &str) -> String {
    format!("{}{}{}.{}", name, EXPORT_MARKER, unix_seconds, extension)
}
