use std::future::Future;
use std::path::Path;

use anyhow::{Context, Result};
use rompatch_core::db::PatcherContext;
use rompatch_core::PatchError;

use crate::canonicalize_or_current;

/// Open the workspace rooted at `root` (config + cache).
pub fn open_context(root: &str) -> Result<PatcherContext> {
    let root_path = canonicalize_or_current(root)?;
    PatcherContext::from_root(&root_path)
}

/// Drive an async operation to completion on a fresh multi-threaded runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

/// User-facing text for a patch failure.
///
/// Errors the user can fix are shown as-is; unsupported patch features get
/// a pointer to the hack's author; anything else is flagged as an internal
/// error.
pub fn describe_patch_error(error: &PatchError) -> String {
    if error.is_unsupported_patch() {
        format!(
            "This patch is not supported. Please ask the ROM hack author to provide a compatible patch and include the error details below:\n{error}"
        )
    } else if error.is_user_actionable() {
        error.to_string()
    } else {
        format!("An error occurred.\n{error}")
    }
}

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}

/// Helper to print whether a file exists.
pub fn print_file_status(label: &str, path: &Path) {
    let exists = path.is_file();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}
