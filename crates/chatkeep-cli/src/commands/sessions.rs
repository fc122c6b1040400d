use super::AppContext;
use anyhow::{Context, Result};
use chatkeep_core::session::{ExportFormat, SearchOptions, render_export};
use chrono::{SecondsFormat, Utc};

pub async fn list(ctx: &AppContext) -> Result<()> {
    let store = ctx.session_store().await?;
    let sessions = store.list_sessions().await?;
    if sessions.is_empty() {
        println!("No saved sessions in {}", ctx.save_dir.display());
        return Ok(());
    }

    for summary in sessions {
        println!(
            "{:<32} {:>5} messages  modified {}",
            summary.name,
            summary.message_count,
            summary.modified_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }
    Ok(())
}

pub async fn latest(ctx: &AppContext) -> Result<()> {
    let store = ctx.session_store().await?;
    match store.last_modified_session().await? {
        Some(name) => println!("{}", name),
        None => println!("No saved sessions in {}", ctx.save_dir.display()),
    }
    Ok(())
}

pub async fn show(ctx: &AppContext, name: &str) -> Result<()> {
    let mut store = ctx.session_store().await?;
    store
        .load(name)
        .await
        .with_context(|| format!("Failed to load session '{}'", name))?;
    print!(
        "{}",
        render_export(store.session(), ExportFormat::Text, Utc::now())?
    );
    Ok(())
}

pub async fn delete(ctx: &AppContext, name: &str) -> Result<()> {
    let store = ctx.session_store().await?;
    store
        .delete_session(name)
        .await
        .with_context(|| format!("Failed to delete session '{}'", name))?;
    println!("Deleted session '{}'", name);
    Ok(())
}

pub async fn backup(ctx: &AppContext, name: &str) -> Result<()> {
    let mut store = ctx.session_store().await?;
    store
        .load(name)
        .await
        .with_context(|| format!("Failed to load session '{}'", name))?;
    match store.create_backup().await? {
        Some(path) => println!("Backup written to {}", path.display()),
        None => println!("Session '{}' is empty, nothing to back up", name),
    }
    Ok(())
}

pub async fn backups(ctx: &AppContext) -> Result<()> {
    let store = ctx.session_store().await?;
    let backups = store.list_backups().await?;
    if backups.is_empty() {
        println!("No backups");
        return Ok(());
    }

    for backup in backups {
        println!(
            "{:<48} {:<24} {}",
            backup.file_name,
            backup.session_name,
            backup.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }
    Ok(())
}

/// Loads a backup and writes it back over its session file.
pub async fn restore(ctx: &AppContext, file: &str) -> Result<()> {
    let mut store = ctx.session_store().await?;
    store
        .restore_backup(file)
        .await
        .with_context(|| format!("Failed to restore backup '{}'", file))?;

    let name = match store.session_name() {
        Some(name) => name.to_string(),
        None => chatkeep_core::session::naming::parse_backup_file_name(file)
            .map(|(name, _)| name)
            .context("Backup does not record which session it belongs to")?,
    };
    let path = store.save(&name).await?;
    println!("Restored '{}' to {}", name, path.display());
    Ok(())
}

pub async fn stats(ctx: &AppContext, name: &str) -> Result<()> {
    let mut store = ctx.session_store().await?;
    store
        .load(name)
        .await
        .with_context(|| format!("Failed to load session '{}'", name))?;
    println!("{}", serde_json::to_string_pretty(&store.analytics())?);
    Ok(())
}

pub async fn search(
    ctx: &AppContext,
    name: &str,
    query: &str,
    options: &SearchOptions,
) -> Result<()> {
    let mut store = ctx.session_store().await?;
    store
        .load(name)
        .await
        .with_context(|| format!("Failed to load session '{}'", name))?;

    let matches = store.search(query, options);
    for message in &matches {
        println!(
            "[{}] {} {}",
            message.role.as_str().to_uppercase(),
            message.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            message.content
        );
    }
    eprintln!("{} matching message(s)", matches.len());
    Ok(())
}

pub async fn export(
    ctx: &AppContext,
    name: &str,
    format: ExportFormat,
    output: Option<&str>,
) -> Result<()> {
    let mut store = ctx.session_store().await?;
    store
        .load(name)
        .await
        .with_context(|| format!("Failed to load session '{}'", name))?;
    let path = store.export(format, output).await?;
    println!("Exported to {}", path.display());
    Ok(())
}
