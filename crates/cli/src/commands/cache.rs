use anyhow::{Context, Result};
use serde::Serialize;

use rompatch_core::db::{CacheEntrySummary, SaveEntry};

use crate::commands::open_context;

#[derive(Serialize)]
pub struct CacheSnapshot {
    pub path: String,
    pub images: Vec<CacheEntrySummary>,
    pub saves: Vec<SaveEntry>,
}

/// Show what the workspace cache holds.
pub fn cache_show_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let snapshot = CacheSnapshot {
        path: ctx.cache_path.display().to_string(),
        images: ctx.cache.list_images().context("Failed to list cached images")?,
        saves: ctx.cache.list_saves().context("Failed to list saves")?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Cache: {}", snapshot.path);
    println!("Images ({}):", snapshot.images.len());
    if snapshot.images.is_empty() {
        println!("  (none)");
    }
    for image in &snapshot.images {
        println!(
            "  - {} = {} [{} bytes] sha1={} stored={}",
            image.key, image.name, image.len, image.digest, image.stored_at
        );
    }
    println!("Saves ({}):", snapshot.saves.len());
    if snapshot.saves.is_empty() {
        println!("  (none)");
    }
    for save in &snapshot.saves {
        println!("  - {} = {} stored={}", save.target, save.name, save.stored_at);
    }

    Ok(())
}

/// Drop every cached image and save.
pub fn cache_clear_command(root: &str) -> Result<()> {
    let ctx = open_context(root)?;
    let removed = ctx.cache.clear().context("Failed to clear cache")?;
    println!("Cleared {removed} cache entr{}", if removed == 1 { "y" } else { "ies" });
    Ok(())
}
