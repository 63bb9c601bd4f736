use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use rompatch::commands::*;
use rompatch_core::Region;
use tracing_subscriber::EnvFilter;

/// Checksum-gated ROM cleaning and hack patching.
///
/// This CLI is a thin wrapper around `rompatch-core` (exposed in code as `rompatch_core`).
/// All substantive logic lives in the library so it can be tested thoroughly
/// and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "rompatch",
    version,
    about = "Clean, region-convert, and patch ROM dumps",
    long_about = None
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new workspace at the given root.
    ///
    /// This will:
    /// - Create a `.rompatch` metadata directory with `config.json` and `cache.db`.
    /// - Create the `out` directory for patched ROMs.
    /// - Write a starter `catalog.yaml` if none exists.
    Init {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional workspace name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,

        /// Base URL of a remote patch store.
        #[arg(long, conflicts_with = "store_dir")]
        store_url: Option<String>,

        /// Local directory laid out like the patch store.
        #[arg(long)]
        store_dir: Option<String>,
    },

    /// Show basic information about an existing workspace.
    Info {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List the hacks in the workspace catalog.
    Targets {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Clean a ROM, convert its region if needed, and apply a hack.
    ///
    /// Without --target or --patch the ROM is only cleaned (and converted to
    /// --region if given).
    Patch {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Source ROM. Defaults to the last ROM cached in the workspace.
        #[arg(long)]
        rom: Option<String>,

        /// Catalog target id (see `rompatch targets`).
        #[arg(long, conflicts_with = "patch")]
        target: Option<String>,

        /// Patch location relative to the store, or an absolute URL.
        #[arg(long)]
        patch: Option<String>,

        /// Region the --patch was authored against.
        #[arg(long, requires = "patch")]
        patch_region: Option<Region>,

        /// Output region when only cleaning.
        #[arg(long)]
        region: Option<Region>,

        /// Expected SHA-1 of the final ROM (case-insensitive).
        #[arg(long)]
        sha1: Option<String>,

        /// Output path. Defaults to `out/<patch name>.nds`.
        #[arg(long)]
        out: Option<String>,

        /// Abort the whole run after this many seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Do not remember --rom in the workspace cache.
        #[arg(long, default_value_t = false)]
        no_cache: bool,
    },

    /// Inspect or clear the workspace cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage save files per target.
    Save {
        #[command(subcommand)]
        action: SaveAction,
    },

    /// Check catalog patches for VCDIFF magic and secondary compression.
    CheckPatches {
        /// Workspace root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Directory holding the patch files. Defaults to the configured
        /// directory store, or the workspace root.
        #[arg(long)]
        store_dir: Option<String>,

        /// Re-encode patches that use secondary compression.
        #[arg(long, default_value_t = false, requires = "rom")]
        recompress: bool,

        /// Clean ROM the patches were made against.
        #[arg(long)]
        rom: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Report a ROM's region and whether it is a clean dump.
    Classify {
        /// ROM file to inspect.
        #[arg(long)]
        rom: String,

        /// Workspace root whose baselines to use. Built-ins are used if it has no config.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// List cached images and saves.
    Show {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Remove every cached image and save.
    Clear {
        #[arg(long, default_value = ".")]
        root: String,
    },
}

#[derive(Subcommand, Debug)]
enum SaveAction {
    /// Store a save file for a target.
    Import {
        #[arg(long, default_value = ".")]
        root: String,

        /// Catalog target id.
        #[arg(long)]
        target: String,

        /// Save file to import.
        #[arg(long)]
        file: String,
    },
    /// Show hero, partner, team, adventures, and play time.
    Info {
        #[arg(long, default_value = ".")]
        root: String,

        /// Stored save to read.
        #[arg(long, conflicts_with = "file")]
        target: Option<String>,

        /// Save file on disk to read.
        #[arg(long)]
        file: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List stored saves.
    List {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Delete the stored save for a target.
    Remove {
        #[arg(long, default_value = ".")]
        root: String,

        /// Catalog target id.
        #[arg(long)]
        target: String,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Init { root, name, store_url, store_dir } => {
            init_workspace_command(&root, name, store_url, store_dir)?
        }
        Command::Info { root, json } => workspace_info_command(&root, json)?,
        Command::Targets { root, json } => list_targets_command(&root, json)?,
        Command::Patch {
            root,
            rom,
            target,
            patch,
            patch_region,
            region,
            sha1,
            out,
            timeout_secs,
            no_cache,
        } => patch_command(PatchArgs {
            root,
            rom,
            target,
            patch,
            patch_region,
            region,
            sha1,
            out,
            timeout_secs,
            no_cache,
        })?,
        Command::Cache { action } => match action {
            CacheAction::Show { root, json } => cache_show_command(&root, json)?,
            CacheAction::Clear { root } => cache_clear_command(&root)?,
        },
        Command::Save { action } => match action {
            SaveAction::Import { root, target, file } => {
                save_import_command(&root, &target, &file)?
            }
            SaveAction::Info { root, target, file, json } => {
                save_info_command(&root, target.as_deref(), file.as_deref(), json)?
            }
            SaveAction::List { root, json } => save_list_command(&root, json)?,
            SaveAction::Remove { root, target } => save_remove_command(&root, &target)?,
        },
        Command::CheckPatches { root, store_dir, recompress, rom, json } => {
            check_patches_command(&root, store_dir.as_deref(), recompress, rom.as_deref(), json)?
        }
        Command::Classify { rom, root, json } => classify_command(&root, &rom, json)?,
    }

    Ok(())
}
