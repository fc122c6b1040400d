use super::AppContext;
use anyhow::{Context, Result};
use chatkeep_core::config::ChatkeepConfig;

pub fn path(ctx: &AppContext) {
    println!("{}", ctx.config_service.path().display());
}

/// Prints the configuration in effect, including command-line overrides.
pub fn show(ctx: &AppContext) -> Result<()> {
    let rendered = toml::to_string_pretty(&ctx.config).context("Failed to render configuration")?;
    print!("{}", rendered);
    println!("# sessions: {}", ctx.save_dir.display());
    println!("# vectors:  {}", ctx.memory_file.display());
    Ok(())
}

pub async fn init(ctx: &AppContext) -> Result<()> {
    let path = ctx.config_service.path();
    if tokio::fs::try_exists(path).await? {
        println!("Configuration already exists at {}", path.display());
        return Ok(());
    }
    ctx.config_service
        .save(&ChatkeepConfig::default())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
