use super::AppContext;
use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};

/// Parses a `key=value` metadata argument.
pub fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", arg))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", arg));
    }
    Ok((key.to_string(), value.to_string()))
}

pub async fn stats(ctx: &AppContext) -> Result<()> {
    let mut store = ctx.vector_store();
    let stats = store.stats().await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

pub async fn get(ctx: &AppContext, id: &str) -> Result<()> {
    let mut store = ctx.vector_store();
    match store.get(id).await? {
        Some(record) => println!("{}", serde_json::to_string_pretty(record)?),
        None => bail!("No vector stored under '{}'", id),
    }
    Ok(())
}

pub async fn delete(ctx: &AppContext, id: &str) -> Result<()> {
    let mut store = ctx.vector_store();
    if store.delete(id).await? {
        ensure_persisted(&mut store).await?;
        println!("Deleted '{}'", id);
    } else {
        println!("No vector stored under '{}'", id);
    }
    Ok(())
}

pub async fn clear(ctx: &AppContext) -> Result<()> {
    let mut store = ctx.vector_store();
    store.clear().await?;
    ensure_persisted(&mut store).await?;
    println!("Cleared vector store {}", ctx.memory_file.display());
    Ok(())
}

pub async fn put(
    ctx: &AppContext,
    id: &str,
    vector: Vec<f32>,
    meta: Vec<(String, String)>,
) -> Result<()> {
    let metadata: Map<String, Value> = meta
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();

    let mut store = ctx.vector_store();
    store
        .store(id, vector, metadata)
        .await
        .with_context(|| format!("Failed to store vector '{}'", id))?;
    store.save().await.context("Failed to save vector store")?;
    println!("Stored '{}'", id);
    Ok(())
}

pub async fn search(ctx: &AppContext, vector: &[f32], k: usize) -> Result<()> {
    let mut store = ctx.vector_store();
    let matches = store.search(vector, k).await?;
    println!("{}", serde_json::to_string_pretty(&matches)?);
    Ok(())
}

/// Saves if the last automatic flush left changes unwritten.
async fn ensure_persisted(store: &mut chatkeep_core::memory::VectorMemoryStore) -> Result<()> {
    if store.has_pending_changes() {
        store.save().await.context("Failed to save vector store")?;
    }
    Ok(())
}
