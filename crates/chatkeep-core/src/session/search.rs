//! Message search over a session's history.

use super::message::{ConversationMessage, MessageRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filters applied by [`search_messages`].
///
/// Role and date bounds are conjunctive pre-filters; date bounds are
/// inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// Only messages from this role
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,

    /// Match case exactly (default: false)
    #[serde(default)]
    pub case_sensitive: bool,

    /// Compare the whole content instead of looking for a substring (default: false)
    #[serde(default)]
    pub exact_match: bool,

    /// Only messages at or after this instant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<DateTime<Utc>>,

    /// Only messages at or before this instant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<DateTime<Utc>>,
}

impl SearchOptions {
    fn admits(&self, message: &ConversationMessage) -> bool {
        if self.role.is_some_and(|role| role != message.role) {
            return false;
        }
        if self.from_date.is_some_and(|from| message.timestamp < from) {
            return false;
        }
        if self.to_date.is_some_and(|to| message.timestamp > to) {
            return false;
        }
        true
    }
}

/// Returns the messages matching `query`, in history order.
pub fn search_messages<'a>(
    messages: &'a [ConversationMessage],
    query: &str,
    options: &SearchOptions,
) -> Vec<&'a ConversationMessage> {
    let needle = if options.case_sensitive {
        query.to_string()
    } else {
        query.to_lowercase()
    };

    messages
        .iter()
        .filter(|message| options.admits(message))
        .filter(|message| {
            let haystack = if options.case_sensitive {
                std::borrow::Cow::Borrowed(message.content.as_str())
            } else {
                std::borrow::Cow::Owned(message.content.to_lowercase())
            };
            if options.exact_match {
                haystack == needle.as_str()
            } else {
                haystack.contains(needle.as_str())
            }
        })
        .collect()
}
