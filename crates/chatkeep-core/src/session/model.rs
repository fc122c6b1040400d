//! Session domain model.
//!
//! This module contains the core Session entity together with the parsing
//! rules applied to session documents read back from storage.

use super::message::ConversationMessage;
use crate::error::{ChatkeepError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata stored alongside a session's conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last written to storage.
    pub last_modified: DateTime<Utc>,
    /// Sanitized name the session was saved under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
    /// Name as originally given by the user, before sanitization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    /// Unique session identifier (UUID format)
    pub session_id: String,
    /// Number of messages in the conversation history.
    pub message_count: usize,
}

impl SessionMetadata {
    fn fresh() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            last_modified: now,
            session_name: None,
            original_name: None,
            session_id: uuid::Uuid::new_v4().to_string(),
            message_count: 0,
        }
    }
}

/// Lenient view of stored metadata; every field may be absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredMetadata {
    created_at: Option<DateTime<Utc>>,
    last_modified: Option<DateTime<Utc>>,
    session_name: Option<String>,
    original_name: Option<String>,
    session_id: Option<String>,
    message_count: Option<usize>,
}

/// A conversation: ordered messages plus metadata.
///
/// The message count in the metadata is kept equal to the number of messages;
/// the history can only grow through [`Session::push`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    metadata: SessionMetadata,
    conversation_history: Vec<ConversationMessage>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates an empty session with a fresh id.
    pub fn new() -> Self {
        Self {
            metadata: SessionMetadata::fresh(),
            conversation_history: Vec::new(),
        }
    }

    /// Parses a stored session document.
    ///
    /// The document must be a JSON object with a `conversationHistory` array
    /// of well-formed messages. Missing or partial metadata is rebuilt from
    /// the messages, and the message count is always recomputed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` when the document does not have that shape.
    pub fn from_document(document: Value, source_name: &str) -> Result<Self> {
        let Value::Object(mut object) = document else {
            return Err(ChatkeepError::invalid_format(
                source_name,
                "expected a JSON object",
            ));
        };

        let history = match object.remove("conversationHistory") {
            Some(history @ Value::Array(_)) => history,
            Some(_) => {
                return Err(ChatkeepError::invalid_format(
                    source_name,
                    "`conversationHistory` is not an array",
                ));
            }
            None => {
                return Err(ChatkeepError::invalid_format(
                    source_name,
                    "missing `conversationHistory` array",
                ));
            }
        };

        let messages: Vec<ConversationMessage> = serde_json::from_value(history)
            .map_err(|e| ChatkeepError::invalid_format(source_name, e.to_string()))?;

        let stored = match object.remove("metadata") {
            Some(raw) => serde_json::from_value::<StoredMetadata>(raw).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable metadata in {}: {}", source_name, e);
                StoredMetadata::default()
            }),
            None => StoredMetadata::default(),
        };

        if let Some(count) = stored.message_count {
            if count != messages.len() {
                tracing::debug!(
                    "Recomputed message count for {}: stored {}, actual {}",
                    source_name,
                    count,
                    messages.len()
                );
            }
        }

        let now = Utc::now();
        let created_at = stored
            .created_at
            .or_else(|| messages.first().map(|m| m.timestamp))
            .unwrap_or(now);
        let last_modified = stored
            .last_modified
            .or_else(|| messages.last().map(|m| m.timestamp))
            .unwrap_or(created_at);

        Ok(Self {
            metadata: SessionMetadata {
                created_at,
                last_modified,
                session_name: stored.session_name,
                original_name: stored.original_name,
                session_id: stored
                    .session_id
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                message_count: messages.len(),
            },
            conversation_history: messages,
        })
    }

    /// Appends a message to the history.
    pub fn push(&mut self, message: ConversationMessage) {
        self.conversation_history.push(message);
        self.metadata.message_count = self.conversation_history.len();
    }

    /// Records a successful save under `session_name`.
    pub fn mark_saved(
        &mut self,
        session_name: impl Into<String>,
        original_name: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        self.metadata.session_name = Some(session_name.into());
        self.metadata.original_name = Some(original_name.into());
        self.metadata.last_modified = at;
    }

    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.conversation_history
    }

    pub fn len(&self) -> usize {
        self.conversation_history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversation_history.is_empty()
    }
}
