use std::fs;

use anyhow::{Context, Result};
use rompatch_core::catalog::Catalog;
use rompatch_core::db::{
    CacheDb, PatchStoreConfig, PatcherConfig, WorkspaceLayout, SOURCE_ROM_KEY,
};
use rompatch_core::Region;
use serde::Serialize;

use crate::commands::{open_context, print_dir_status, print_file_status};
use crate::{canonicalize_or_current, infer_workspace_name};

#[derive(Serialize)]
pub struct WorkspaceInfoSnapshot {
    pub name: String,
    pub root: String,
    pub config_file: String,
    pub config_version: String,
    pub cache_path: String,
    pub catalog_path: String,
    pub store: PatchStoreConfig,
    pub baselines: Vec<BaselineInfo>,
    pub xdelta3: String,
    pub cached_rom: Option<String>,
    /// Number of catalog targets; `None` when the catalog cannot be loaded.
    pub targets: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_error: Option<String>,
}

#[derive(Serialize)]
pub struct BaselineInfo {
    pub region: Region,
    pub sha1: String,
}

/// Initialize a new workspace at `root`.
pub fn init_workspace_command(
    root: &str,
    name: Option<String>,
    store_url: Option<String>,
    store_dir: Option<String>,
) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = WorkspaceLayout::new(&root_path);

    let workspace_name = match name {
        Some(n) => n,
        None => infer_workspace_name(&root_path),
    };

    fs::create_dir_all(&layout.meta_dir)
        .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;
    fs::create_dir_all(&layout.out_dir)
        .with_context(|| format!("Failed to create output dir: {}", layout.out_dir.display()))?;

    let store = match (store_url, store_dir) {
        (_, Some(path)) => PatchStoreConfig::Directory { path },
        (Some(base_url), None) => PatchStoreConfig::Http { base_url },
        (None, None) => PatchStoreConfig::default(),
    };
    let config = PatcherConfig::new(
        &workspace_name,
        layout.relative_string(&layout.cache_path),
        layout.relative_string(&layout.catalog_path),
    )
    .with_store(store);

    let json = serde_json::to_string_pretty(&config)?;
    fs::write(&layout.config_path, json).with_context(|| {
        format!("Failed to write workspace config: {}", layout.config_path.display())
    })?;

    // Keep an existing catalog; seed a fresh one with the published hacks.
    if !layout.catalog_path.exists() {
        let yaml = serde_yaml::to_string(&Catalog::published())
            .context("Failed to serialize starter catalog")?;
        fs::write(&layout.catalog_path, yaml).with_context(|| {
            format!("Failed to write catalog: {}", layout.catalog_path.display())
        })?;
    }

    CacheDb::open(&layout.cache_path).with_context(|| {
        format!("Failed to initialize cache database at {}", layout.cache_path.display())
    })?;

    println!("Initialized rompatch workspace:");
    println!("  Name: {}", workspace_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.config_path.display());
    println!("  Cache (relative): {}", config.cache_path);
    println!("  Catalog (relative): {}", config.catalog_path);
    println!("  Output dir: {}", layout.out_dir.display());

    Ok(())
}

/// Show basic information about an existing workspace.
pub fn workspace_info_command(root: &str, json: bool) -> Result<()> {
    use rompatch_core::db::ImageCache;
    use rompatch_core::engine::Xdelta3Backend;

    let ctx = open_context(root)?;
    let layout = &ctx.layout;
    let catalog_path = layout.resolve(&ctx.config.catalog_path);
    let (targets, catalog_error) = match ctx.catalog() {
        Ok(catalog) => (Some(catalog.len()), None),
        Err(e) => (None, Some(format!("{e:#}"))),
    };
    let cached_rom = ctx
        .cache
        .load(SOURCE_ROM_KEY)
        .context("Failed to read cache")?
        .map(|entry| format!("{} ({})", entry.name, entry.image.digest()));
    let xdelta3 = Xdelta3Backend::new(ctx.config.xdelta3_path.clone());
    let baselines = ctx.baselines();

    let snapshot = WorkspaceInfoSnapshot {
        name: ctx.config.name.clone(),
        root: layout.root.display().to_string(),
        config_file: layout.config_path.display().to_string(),
        config_version: ctx.config.config_version.clone(),
        cache_path: ctx.config.cache_path.clone(),
        catalog_path: ctx.config.catalog_path.clone(),
        store: ctx.config.store.clone(),
        baselines: baselines
            .regions()
            .into_iter()
            .filter_map(|region| {
                baselines
                    .expected_digest(region)
                    .map(|d| BaselineInfo { region, sha1: d.to_string() })
            })
            .collect(),
        xdelta3: xdelta3.bin().display().to_string(),
        cached_rom,
        targets,
        catalog_error,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("rompatch Workspace Info");
    println!("=======================");
    println!("Name: {}", snapshot.name);
    println!("Root: {}", snapshot.root);
    println!("Config file: {}", snapshot.config_file);
    println!("Config version: {}", snapshot.config_version);
    println!("Cache path (config): {}", snapshot.cache_path);
    println!("Catalog path (config): {}", snapshot.catalog_path);
    match &snapshot.store {
        PatchStoreConfig::Http { base_url } => println!("Patch store: {base_url}"),
        PatchStoreConfig::Directory { path } => println!("Patch store (directory): {path}"),
    }
    println!("xdelta3: {}", snapshot.xdelta3);
    match (snapshot.targets, &snapshot.catalog_error) {
        (Some(count), _) => println!("Targets: {count}"),
        (None, Some(err)) => println!("Targets: invalid ({err})"),
        (None, None) => println!("Targets: invalid"),
    }
    println!("Cached ROM: {}", snapshot.cached_rom.as_deref().unwrap_or("(none)"));
    println!();

    println!("Baselines:");
    for baseline in &snapshot.baselines {
        println!("  - {}: {}", baseline.region, baseline.sha1);
    }
    println!();

    println!("Paths:");
    print_dir_status("Meta dir (.rompatch)", &layout.meta_dir);
    print_file_status("Catalog", &catalog_path);
    print_dir_status("Output dir", &layout.out_dir);

    Ok(())
}
