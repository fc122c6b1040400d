//! Rendering a session into export formats.
//!
//! Rendering is deterministic: the same session and export instant always
//! produce the same bytes.

use super::analytics::ConversationAnalytics;
use super::message::MessageRole;
use super::model::Session;
use crate::error::{ChatkeepError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

const RULE_WIDTH: usize = 50;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Markdown,
    Text,
    Csv,
}

impl ExportFormat {
    /// File extension written for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
            ExportFormat::Text => "txt",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Text => "text",
            ExportFormat::Csv => "csv",
        };
        f.write_str(name)
    }
}

impl FromStr for ExportFormat {
    type Err = ChatkeepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "text" | "txt" => Ok(ExportFormat::Text),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ChatkeepError::validation(format!(
                "unsupported export format '{}': expected json, markdown, text or csv",
                other
            ))),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    #[serde(flatten)]
    session: &'a Session,
    analytics: ConversationAnalytics,
    exported_at: String,
}

/// Renders `session` in `format`, stamping it with `exported_at`.
pub fn render_export(
    session: &Session,
    format: ExportFormat,
    exported_at: DateTime<Utc>,
) -> Result<String> {
    match format {
        ExportFormat::Json => render_json(session, exported_at),
        ExportFormat::Markdown => Ok(render_markdown(session, exported_at)),
        ExportFormat::Text => Ok(render_text(session, exported_at)),
        ExportFormat::Csv => Ok(render_csv(session)),
    }
}

fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn title(session: &Session) -> &str {
    let metadata = session.metadata();
    metadata
        .original_name
        .as_deref()
        .or(metadata.session_name.as_deref())
        .unwrap_or("Untitled conversation")
}

fn role_label(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "User",
        MessageRole::Assistant => "Assistant",
    }
}

fn render_json(session: &Session, exported_at: DateTime<Utc>) -> Result<String> {
    let export = JsonExport {
        session,
        analytics: ConversationAnalytics::from_messages(session.messages()),
        exported_at: iso(exported_at),
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

fn render_markdown(session: &Session, exported_at: DateTime<Utc>) -> String {
    let metadata = session.metadata();
    let mut out = String::new();

    let _ = writeln!(out, "# {}", title(session));
    out.push('\n');
    let _ = writeln!(out, "- **Session ID:** {}", metadata.session_id);
    let _ = writeln!(out, "- **Created:** {}", iso(metadata.created_at));
    let _ = writeln!(out, "- **Messages:** {}", metadata.message_count);
    let _ = writeln!(out, "- **Exported:** {}", iso(exported_at));

    for message in session.messages() {
        out.push_str("\n---\n\n");
        let _ = writeln!(
            out,
            "### {} ({})",
            role_label(message.role),
            iso(message.timestamp)
        );
        out.push('\n');
        out.push_str(&message.content);
        out.push('\n');
    }

    out
}

fn render_text(session: &Session, exported_at: DateTime<Utc>) -> String {
    let metadata = session.metadata();
    let heavy_rule = "=".repeat(RULE_WIDTH);
    let light_rule = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "Conversation: {}", title(session));
    let _ = writeln!(out, "Session ID: {}", metadata.session_id);
    let _ = writeln!(out, "Messages: {}", metadata.message_count);
    let _ = writeln!(out, "Exported: {}", iso(exported_at));
    let _ = writeln!(out, "{}", heavy_rule);

    for message in session.messages() {
        out.push('\n');
        let _ = writeln!(
            out,
            "[{}] {}",
            message.role.as_str().to_uppercase(),
            iso(message.timestamp)
        );
        let _ = writeln!(out, "{}", message.content);
        let _ = writeln!(out, "{}", light_rule);
    }

    out
}

fn csv_quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn render_csv(session: &Session) -> String {
    let mut out = String::from("Timestamp,Role,Content,MessageID\n");
    for message in session.messages() {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            iso(message.timestamp),
            message.role,
            csv_quote(&message.content),
            csv_quote(&message.message_id)
        );
    }
    out
}
