use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rompatch_core::Image;

pub mod commands;

/// Canonicalize the root path if possible, falling back to the given string
/// relative to the current working directory.
pub fn canonicalize_or_current(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    if path == Path::new(".") {
        Ok(env::current_dir().context("Failed to get current directory")?)
    } else {
        // The path may not exist yet (e.g. `init` on a fresh directory).
        match path.canonicalize() {
            Ok(p) => Ok(p),
            Err(_) => {
                let cwd = env::current_dir().context("Failed to get current directory")?;
                Ok(cwd.join(path))
            }
        }
    }
}

/// Infer a workspace name from the root path.
///
/// If the root has no final component (e.g., `/`), fallback to `unnamed-workspace`.
pub fn infer_workspace_name(root: &Path) -> String {
    root.file_name().and_then(|os_str| os_str.to_str()).unwrap_or("unnamed-workspace").to_string()
}

/// Read a ROM (or any binary) file into an [`Image`].
pub fn read_image(path: &Path) -> Result<Image> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read ROM file: {}", path.display()))?;
    Ok(Image::from(bytes))
}

/// File name component for display, falling back to the full path.
pub fn display_file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|os| os.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}
