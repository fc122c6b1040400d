//! Aggregate statistics over a conversation.

use super::message::{ConversationMessage, MessageRole};
use chrono::Timelike;
use serde::Serialize;

/// Summary statistics for a conversation history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAnalytics {
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    /// Mean content length in characters (0.0 for an empty history)
    pub average_message_length: f64,
    /// Milliseconds between the first and the last message
    pub duration_ms: Option<i64>,
    /// Hour of day (UTC, 0-23) with the most messages; ties go to the earliest hour
    pub most_active_hour: Option<u32>,
}

impl ConversationAnalytics {
    /// Computes analytics for `messages`.
    pub fn from_messages(messages: &[ConversationMessage]) -> Self {
        let user_messages = messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count();
        let assistant_messages = messages.len() - user_messages;

        let total_chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();
        let average_message_length = if messages.is_empty() {
            0.0
        } else {
            total_chars as f64 / messages.len() as f64
        };

        let duration_ms = match (messages.first(), messages.last()) {
            (Some(first), Some(last)) => {
                Some((last.timestamp - first.timestamp).num_milliseconds())
            }
            _ => None,
        };

        let mut per_hour = [0usize; 24];
        for message in messages {
            per_hour[message.timestamp.hour() as usize] += 1;
        }
        // max_by_key returns the last maximum, so scan hours in reverse
        let most_active_hour = per_hour
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, count)| **count > 0)
            .max_by_key(|(_, count)| **count)
            .map(|(hour, _)| hour as u32);

        Self {
            total_messages: messages.len(),
            user_messages,
            assistant_messages,
            average_message_length,
            duration_ms,
            most_active_hour,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(role: MessageRole, content: &str, hour: u32, minute: u32) -> ConversationMessage {
        ConversationMessage {
            role,
            content: content.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap(),
            message_id: format!("{}-{}", hour, minute),
        }
    }

    #[test]
    fn test_empty_history() {
        let analytics = ConversationAnalytics::from_messages(&[]);
        assert_eq!(analytics.total_messages, 0);
        assert_eq!(analytics.average_message_length, 0.0);
        assert_eq!(analytics.duration_ms, None);
        assert_eq!(analytics.most_active_hour, None);
    }

    #[test]
    fn test_counts_and_duration() {
        let messages = vec![
            at(MessageRole::User, "abcd", 8, 0),
            at(MessageRole::Assistant, "ab", 8, 30),
            at(MessageRole::User, "abcdef", 9, 0),
        ];

        let analytics = ConversationAnalytics::from_messages(&messages);

        assert_eq!(analytics.total_messages, 3);
        assert_eq!(
            analytics.total_messages,
            analytics.user_messages + analytics.assistant_messages
        );
        assert_eq!(analytics.user_messages, 2);
        assert_eq!(analytics.average_message_length, 4.0);
        assert_eq!(analytics.duration_ms, Some(60 * 60 * 1000));
        assert_eq!(analytics.most_active_hour, Some(8));
    }

    #[test]
    fn test_most_active_hour_ties_go_to_lowest_hour() {
        let messages = vec![
            at(MessageRole::User, "late", 22, 0),
            at(MessageRole::Assistant, "late", 22, 1),
            at(MessageRole::User, "early", 3, 0),
            at(MessageRole::Assistant, "early", 3, 1),
        ];

        let analytics = ConversationAnalytics::from_messages(&messages);
        assert_eq!(analytics.most_active_hour, Some(3));
    }
}
