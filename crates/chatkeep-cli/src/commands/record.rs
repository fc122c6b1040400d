//! Transcript recording with exit-time autosave.
//!
//! Reads `role: content` lines from stdin into the active session. A few
//! slash commands control the session while recording:
//!
//! - `/save <name>`: save under `name`
//! - `/autosave`: toggle saving on exit
//! - `/backup`: write a timestamped backup
//! - `/clear`: start a new, empty session
//!
//! On EOF or Ctrl-C the session is handed to
//! [`AutosaveController::flush_and_close`].

use super::AppContext;
use anyhow::{Context, Result};
use chatkeep_core::session::{AutosaveController, MessageRole};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Exit status after an interrupt (128 + SIGINT).
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, PartialEq)]
enum Line {
    Message(MessageRole, String),
    Save(String),
    ToggleAutosave,
    Backup,
    Clear,
    Blank,
    Invalid(String),
}

fn parse_line(line: &str) -> Line {
    let line = line.trim();
    if line.is_empty() {
        return Line::Blank;
    }

    if let Some(command) = line.strip_prefix('/') {
        let (name, arg) = command
            .split_once(char::is_whitespace)
            .map(|(name, arg)| (name, arg.trim()))
            .unwrap_or((command, ""));
        return match name {
            "save" if !arg.is_empty() => Line::Save(arg.to_string()),
            "save" => Line::Invalid("usage: /save <name>".to_string()),
            "autosave" => Line::ToggleAutosave,
            "backup" => Line::Backup,
            "clear" => Line::Clear,
            other => Line::Invalid(format!("unknown command '/{}'", other)),
        };
    }

    let Some((role, content)) = line.split_once(':') else {
        return Line::Invalid(format!("expected 'role: content', got '{}'", line));
    };
    match role.parse::<MessageRole>() {
        Ok(role) => Line::Message(role, content.trim().to_string()),
        Err(e) => Line::Invalid(e.to_string()),
    }
}

pub async fn run(ctx: &AppContext, resume: Option<&str>, no_autosave: bool) -> Result<()> {
    let mut store = ctx.session_store().await?;
    if let Some(name) = resume {
        store
            .load(name)
            .await
            .with_context(|| format!("Failed to resume session '{}'", name))?;
    }

    let mut autosave = ctx.config.autosave.clone();
    if no_autosave {
        autosave.enabled = false;
    }
    let controller = Arc::new(AutosaveController::new(store, &autosave));

    let hook = Arc::clone(&controller);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, closing session");
            report_close(hook.flush_and_close().await);
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if let Err(e) = apply_line(&controller, &line).await {
            tracing::warn!("{:#}", e);
        }
    }

    // The hook must be gone before the final save so it cannot exit the process mid-write.
    interrupt.abort();
    report_close(controller.flush_and_close().await);
    Ok(())
}

async fn apply_line(controller: &AutosaveController, line: &str) -> Result<()> {
    match parse_line(line) {
        Line::Message(role, content) => {
            controller.store().await.add_message(role, content);
        }
        Line::Save(name) => {
            let path = controller.store().await.save(&name).await?;
            eprintln!("Saved to {}", path.display());
        }
        Line::ToggleAutosave => {
            let enabled = controller.toggle();
            eprintln!("Autosave {}", if enabled { "on" } else { "off" });
        }
        Line::Backup => {
            if let Some(path) = controller.store().await.create_backup().await? {
                eprintln!("Backup written to {}", path.display());
            }
        }
        Line::Clear => controller.store().await.clear(),
        Line::Blank => {}
        Line::Invalid(reason) => tracing::warn!("Skipping line: {}", reason),
    }
    Ok(())
}

fn report_close(result: chatkeep_core::Result<Option<PathBuf>>) {
    match result {
        Ok(Some(path)) => eprintln!("Session saved to {}", path.display()),
        Ok(None) => tracing::debug!("Nothing to save on exit"),
        Err(e) => tracing::error!("Failed to save session on exit: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_messages() {
        assert_eq!(
            parse_line("user: hello: world "),
            Line::Message(MessageRole::User, "hello: world".to_string())
        );
        assert_eq!(
            parse_line("Assistant:hi"),
            Line::Message(MessageRole::Assistant, "hi".to_string())
        );
        assert_eq!(parse_line("   "), Line::Blank);
        assert!(matches!(parse_line("system: nope"), Line::Invalid(_)));
        assert!(matches!(parse_line("no colon here"), Line::Invalid(_)));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_line("/save my chat"), Line::Save("my chat".to_string()));
        assert_eq!(parse_line("/autosave"), Line::ToggleAutosave);
        assert_eq!(parse_line("/backup"), Line::Backup);
        assert_eq!(parse_line("/clear"), Line::Clear);
        assert!(matches!(parse_line("/save"), Line::Invalid(_)));
        assert!(matches!(parse_line("/quit"), Line::Invalid(_)));
    }
}
