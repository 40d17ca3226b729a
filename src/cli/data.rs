//! Storage maintenance commands

use anyhow::{Context, Result};
use raidesk_storage::{open_storage, StorageAdapter};
use std::sync::Arc;

async fn open_configured() -> Result<Arc<dyn StorageAdapter>> {
    let config = crate::server::load_config()?;
    crate::server::validate_config(&config)?;
    open_storage(&config.storage)
        .await
        .with_context(|| format!("Failed to open {} storage", config.storage.backend))
}

fn confirm(prompt: &str) -> bool {
    use std::io::{self, Write};
    print!("{prompt} [y/N] ");
    io::stdout().flush().ok();
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_ok() {
        matches!(input.trim(), "y" | "Y" | "yes" | "YES")
    } else {
        false
    }
}

// ── Sweep ────────────────────────────────────────────────────────────

pub async fn sweep() -> Result<()> {
    let storage = open_configured().await?;
    let purged = storage
        .purge_expired()
        .await
        .context("Expiry sweep failed")?;

    if storage.backend_name() == "redis" {
        println!("Redis expires keys natively, nothing to sweep.");
    } else {
        println!("Purged {purged} expired entr{}.", if purged == 1 { "y" } else { "ies" });
    }

    storage.disconnect().await.ok();
    Ok(())
}

// ── Clear ────────────────────────────────────────────────────────────

pub async fn clear(force: bool) -> Result<()> {
    if !force && !confirm("This will delete ALL sessions and plans. Continue?") {
        println!("Aborted.");
        return Ok(());
    }

    let storage = open_configured().await?;
    storage.clear_all().await.context("Failed to clear storage")?;
    println!("Cleared all data from {} storage.", storage.backend_name());

    storage.disconnect().await.ok();
    Ok(())
}

// ── Check ────────────────────────────────────────────────────────────

pub async fn check() -> Result<()> {
    let storage = open_configured().await?;
    let healthy = storage.health_check().await.unwrap_or(false);
    println!(
        "Storage backend: {} ({})",
        storage.backend_name(),
        if healthy { "healthy" } else { "unreachable" }
    );
    storage.disconnect().await.ok();

    if !healthy {
        anyhow::bail!("Storage health check failed");
    }
    Ok(())
}
