use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::db::{CacheDb, PatcherConfig, WorkspaceLayout};

/// Load the workspace config JSON from disk for a given layout.
pub fn load_patcher_config(layout: &WorkspaceLayout) -> Result<PatcherConfig> {
    let config_json = std::fs::read_to_string(&layout.config_path).with_context(|| {
        format!("Failed to read workspace config at {}", layout.config_path.display())
    })?;
    let config: PatcherConfig =
        serde_json::from_str(&config_json).context("Failed to parse workspace config JSON")?;
    Ok(config)
}

/// Resolve the cache path (respecting relative/absolute config) and open a CacheDb.
pub fn open_cache_db(layout: &WorkspaceLayout) -> Result<(PatcherConfig, PathBuf, CacheDb)> {
    let config = load_patcher_config(layout)?;
    let cache_path = layout.resolve(&config.cache_path);
    let db = CacheDb::open(&cache_path)
        .with_context(|| format!("Failed to open cache database at {}", cache_path.display()))?;
    Ok((config, cache_path, db))
}
