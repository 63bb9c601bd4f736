use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use rompatch_core::catalog::file_stem_from_location;
use rompatch_core::db::{CachedImage, ImageCache, PatcherContext, SOURCE_ROM_KEY};
use rompatch_core::pipeline::RunReport;
use rompatch_core::{Digest, Image, PatchError, Pipeline, PipelineRequest, Region};

use crate::commands::{block_on, describe_patch_error, open_context};
use crate::{display_file_name, read_image};

/// Options for `rompatch patch`.
#[derive(Debug, Default, Clone)]
pub struct PatchArgs {
    pub root: String,
    /// Source ROM; falls back to the cached one.
    pub rom: Option<String>,
    /// Catalog target id.
    pub target: Option<String>,
    /// Ad-hoc patch location (relative to the store or absolute URL).
    pub patch: Option<String>,
    /// Region the ad-hoc patch was authored against.
    pub patch_region: Option<Region>,
    /// Output region when only cleaning.
    pub region: Option<Region>,
    /// Expected SHA-1 of the final image.
    pub sha1: Option<String>,
    pub out: Option<String>,
    pub timeout_secs: Option<u64>,
    pub no_cache: bool,
}

/// Clean, transition, and patch a ROM, then write the result.
pub fn patch_command(args: PatchArgs) -> Result<()> {
    let ctx = open_context(&args.root)?;
    let (request, stem) = build_request(&ctx, &args)?;
    let (rom, rom_name) = load_source_rom(&ctx, args.rom.as_deref())?;

    let source = ctx.patch_source()?;
    let engine = ctx.diff_engine()?;
    let baselines = ctx.baselines();
    let pipeline = Pipeline::new(source.as_ref(), &engine, &baselines);

    // Remember the ROM only once it is known to be usable.
    if args.rom.is_some() && !args.no_cache {
        pipeline.classify(&rom).map_err(|e| anyhow!(describe_patch_error(&e)))?;
        ctx.cache
            .store(SOURCE_ROM_KEY, &CachedImage::new(&rom_name, rom.clone()))
            .context("Failed to cache source ROM")?;
    }

    tracing::info!(rom = %rom_name, store = source.name(), engine = engine.algorithm_name(), "starting patch run");
    let outcome = block_on(async {
        let run = pipeline.run_detailed(rom, &request);
        match args.timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), run).await {
                Ok(result) => result.map_err(|e| e.error),
                Err(_) => Err(PatchError::timed_out(Duration::from_secs(secs))),
            },
            None => run.await.map_err(|e| e.error),
        }
    })?;
    let report = outcome.map_err(|e| anyhow!(describe_patch_error(&e)))?;

    let out_path = match &args.out {
        Some(out) => PathBuf::from(out),
        None => ctx.layout.output_path(&stem),
    };
    write_output(&out_path, &report.image)?;
    print_report(&report, &out_path);

    Ok(())
}

/// Resolve the pipeline request and output file stem from the arguments.
pub fn build_request(ctx: &PatcherContext, args: &PatchArgs) -> Result<(PipelineRequest, String)> {
    let expected = args
        .sha1
        .as_deref()
        .map(|s| s.parse::<Digest>().map_err(|e| anyhow!("Invalid --sha1 '{s}': {e}")))
        .transpose()?;

    let (request, stem) = match (&args.target, &args.patch) {
        (Some(_), Some(_)) => bail!("Pass either --target or --patch, not both"),
        (Some(id), None) => {
            let catalog = ctx.catalog().context("Failed to load target catalog")?;
            let target = catalog.get(id)?;
            (target.request(), target.file_stem())
        }
        (None, Some(location)) => {
            let region = args.patch_region.unwrap_or(Region::Us);
            (PipelineRequest::target(location.clone(), region), file_stem_from_location(location))
        }
        (None, None) => {
            let request = PipelineRequest::clean_only().with_target_region(args.region);
            let stem = match args.region {
                Some(region) => format!("clean-{region}"),
                None => "clean".to_string(),
            };
            (request, stem)
        }
    };

    if args.region.is_some() && request.target_patch.is_some() {
        bail!("--region only applies when no target patch is given; the patch decides the region");
    }

    // An explicit --sha1 wins over the catalog's digest.
    let request = match expected {
        Some(digest) => request.with_expected_digest(Some(digest)),
        None => request,
    };
    Ok((request, stem))
}

fn load_source_rom(ctx: &PatcherContext, rom: Option<&str>) -> Result<(Image, String)> {
    if let Some(path) = rom {
        let path = Path::new(path);
        return Ok((read_image(path)?, display_file_name(path)));
    }
    match ctx.cache.load(SOURCE_ROM_KEY).context("Failed to read cache")? {
        Some(entry) => {
            tracing::info!(name = %entry.name, "using cached ROM");
            Ok((entry.image, entry.name))
        }
        None => bail!("No ROM given and none cached. Pass --rom <path>"),
    }
}

fn write_output(path: &Path, image: &Image) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output dir: {}", parent.display()))?;
    }
    fs::write(path, image.as_bytes())
        .with_context(|| format!("Failed to write patched ROM: {}", path.display()))
}

fn print_report(report: &RunReport, out_path: &Path) {
    println!("Patched ROM written:");
    println!("  Source: {} ({})", report.source_region, report.source_digest);
    println!("  Cleaned: {}", if report.cleaned { "yes" } else { "already clean" });
    if report.transitioned {
        println!("  Region: {} -> {}", report.source_region, report.region);
    } else {
        println!("  Region: {}", report.region);
    }
    println!("  Target patch: {}", if report.patched { "applied" } else { "none" });
    println!("  SHA-1: {}", report.digest);
    println!("  Output: {}", out_path.display());
}
