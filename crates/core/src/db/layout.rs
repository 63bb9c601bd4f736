use std::path::{Path, PathBuf};

/// Logical layout of a patcher workspace on disk.
///
/// This is derived from a chosen root path. It does *not* perform any IO itself.
/// The CLI or other frontends are responsible for actually creating directories
/// and files based on this layout.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    /// Root directory of the workspace.
    pub root: PathBuf,
    /// Directory for internal metadata (.rompatch).
    pub meta_dir: PathBuf,
    /// Path to the workspace config file (JSON).
    pub config_path: PathBuf,
    /// Path to the cache database file.
    pub cache_path: PathBuf,
    /// Path to the target catalog.
    pub catalog_path: PathBuf,
    /// Directory for patched output images.
    pub out_dir: PathBuf,
}

impl WorkspaceLayout {
    /// Compute the default layout for a workspace rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let meta_dir = root.join(".rompatch");
        let config_path = meta_dir.join("config.json");
        let cache_path = meta_dir.join("cache.db");
        let catalog_path = root.join("catalog.yaml");
        let out_dir = root.join("out");

        Self { root, meta_dir, config_path, cache_path, catalog_path, out_dir }
    }

    /// Path string suitable for storing in `PatcherConfig`, relative to
    /// `root` when possible.
    pub fn relative_string(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_string_lossy().to_string(),
            Err(_) => path.to_string_lossy().to_string(),
        }
    }

    /// Resolve a config-stored path (relative to root unless absolute).
    pub fn resolve(&self, configured: &str) -> PathBuf {
        let path = Path::new(configured);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Default output file for a target.
    pub fn output_path(&self, file_stem: &str) -> PathBuf {
        self.out_dir.join(format!("{file_stem}.nds"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_are_derived_from_root() {
        let layout = WorkspaceLayout::new("/tmp/ws");
        assert_eq!(layout.config_path, PathBuf::from("/tmp/ws/.rompatch/config.json"));
        assert_eq!(layout.relative_string(&layout.cache_path), ".rompatch/cache.db");
        assert_eq!(layout.resolve("catalog.yaml"), PathBuf::from("/tmp/ws/catalog.yaml"));
        assert_eq!(layout.resolve("/abs/c.yaml"), PathBuf::from("/abs/c.yaml"));
        assert_eq!(layout.output_path("chip2"), PathBuf::from("/tmp/ws/out/chip2.nds"));
    }
}
