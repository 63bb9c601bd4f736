use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use rompatch_core::baseline::BaselineRegistry;
use rompatch_core::db::{PatchStoreConfig, PatcherContext, WorkspaceLayout};
use rompatch_core::engine::{DiffAlgorithm, Xdelta3Backend};
use rompatch_core::region;
use rompatch_core::source::DirectoryPatchSource;
use rompatch_core::{Diff, PatchKey, Region};
use serde::Serialize;

use crate::commands::{describe_patch_error, open_context};
use crate::{canonicalize_or_current, read_image};

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatchCheckStatus {
    Ok,
    SecondaryCompression,
    Recompressed,
    Missing,
    InvalidMagic,
}

#[derive(Debug, Serialize)]
pub struct PatchCheck {
    pub target: String,
    pub path: String,
    pub status: PatchCheckStatus,
}

/// Check every catalog patch in a local store for VCDIFF magic and
/// secondary compression, optionally re-encoding compressed ones.
pub fn check_patches_command(
    root: &str,
    store_dir: Option<&str>,
    recompress: bool,
    rom: Option<&str>,
    json: bool,
) -> Result<()> {
    let ctx = open_context(root)?;
    let catalog = ctx.catalog().context("Failed to load target catalog")?;
    let store = DirectoryPatchSource::new(resolve_store_dir(&ctx, store_dir));

    let recompressor = match (recompress, rom) {
        (true, Some(rom)) => {
            Some((Xdelta3Backend::new(ctx.config.xdelta3_path.clone()), read_image(Path::new(rom))?))
        }
        (true, None) => bail!("--recompress needs --rom <clean ROM> to decode against"),
        (false, _) => None,
    };

    let mut checks = Vec::new();
    for target in &catalog.targets {
        let key = PatchKey::Target { location: target.patch.clone() };
        let path = store.path_for(&key);
        let status = match fs::read(&path) {
            Err(e) if e.kind() == ErrorKind::NotFound => PatchCheckStatus::Missing,
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read patch for '{}': {}", target.id, path.display()))
            }
            Ok(bytes) => match Diff::parse(&key, bytes) {
                Err(_) => PatchCheckStatus::InvalidMagic,
                Ok(diff) if !diff.uses_secondary_compression() => PatchCheckStatus::Ok,
                Ok(diff) => match &recompressor {
                    Some((backend, base)) => {
                        recompress_patch(backend, base.as_bytes(), &diff, &path)?;
                        PatchCheckStatus::Recompressed
                    }
                    None => PatchCheckStatus::SecondaryCompression,
                },
            },
        };
        checks.push(PatchCheck {
            target: target.id.clone(),
            path: path.display().to_string(),
            status,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&checks)?);
    } else {
        println!("Patches ({}):", checks.len());
        for check in &checks {
            println!("  - {} [{:?}] {}", check.target, check.status, check.path);
        }
    }

    let invalid = checks.iter().filter(|c| c.status == PatchCheckStatus::InvalidMagic).count();
    if invalid > 0 {
        bail!("{invalid} patch(es) do not start with the VCDIFF magic bytes");
    }
    Ok(())
}

fn resolve_store_dir(ctx: &PatcherContext, store_dir: Option<&str>) -> PathBuf {
    match (store_dir, &ctx.config.store) {
        (Some(dir), _) => ctx.layout.resolve(dir),
        (None, PatchStoreConfig::Directory { path }) => ctx.layout.resolve(path),
        (None, PatchStoreConfig::Http { .. }) => ctx.layout.root.clone(),
    }
}

/// Decode `diff` against `base`, then re-encode without secondary
/// compression and overwrite `path`.
fn recompress_patch(backend: &Xdelta3Backend, base: &[u8], diff: &Diff, path: &Path) -> Result<()> {
    tracing::info!(path = %path.display(), "re-compressing patch without secondary compression");
    let target = backend
        .apply(base, diff.as_bytes())
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    let encoded = backend
        .encode(base, &target)
        .with_context(|| format!("Failed to re-encode {}", path.display()))?;
    fs::write(path, encoded).with_context(|| format!("Failed to write {}", path.display()))
}

#[derive(Debug, Serialize)]
pub struct RomClassification {
    pub region: Region,
    pub sha1: String,
    pub clean: bool,
    /// Region whose clean digest this ROM has, if any.
    pub baseline_of: Option<Region>,
}

/// Report a ROM's header region and whether it is a clean dump.
pub fn classify_command(root: &str, rom: &str, json: bool) -> Result<()> {
    let baselines = workspace_baselines(root)?;
    let image = read_image(Path::new(rom))?;
    let region = region::classify(&image).map_err(|e| anyhow!(describe_patch_error(&e)))?;
    let digest = image.digest();

    let info = RomClassification {
        region,
        sha1: digest.to_string(),
        clean: baselines.expected_digest(region) == Some(&digest),
        baseline_of: baselines.region_of(&digest),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Region: {}", info.region);
    println!("SHA-1: {}", info.sha1);
    match (info.clean, baselines.contains(region)) {
        (true, _) => println!("Clean: yes"),
        (false, true) => println!("Clean: no (a clean patch is needed)"),
        (false, false) => println!("Clean: unknown (no baseline for {region})"),
    }
    Ok(())
}

/// Baselines from the workspace config when one exists, built-ins otherwise.
fn workspace_baselines(root: &str) -> Result<BaselineRegistry> {
    let layout = WorkspaceLayout::new(canonicalize_or_current(root)?);
    if layout.config_path.is_file() {
        Ok(open_context(root)?.baselines())
    } else {
        Ok(BaselineRegistry::default())
    }
}
