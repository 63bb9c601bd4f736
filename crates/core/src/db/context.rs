use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::baseline::BaselineRegistry;
use crate::catalog::Catalog;
use crate::db::{open_cache_db, CacheDb, PatcherConfig, PatchStoreConfig, WorkspaceLayout};
use crate::engine::{DiffEngine, Xdelta3Backend};
use crate::source::{DirectoryPatchSource, HttpPatchSource, PatchSource};

/// Convenience wrapper bundling layout, config, cache path, and an open CacheDb.
#[derive(Debug)]
pub struct PatcherContext {
    pub layout: WorkspaceLayout,
    pub config: PatcherConfig,
    pub cache_path: PathBuf,
    pub cache: CacheDb,
}

impl PatcherContext {
    /// Load the workspace config and open the cache for a given root.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = WorkspaceLayout::new(root);
        let (config, cache_path, cache) = open_cache_db(&layout)?;
        Ok(Self { layout, config, cache_path, cache })
    }

    pub fn baselines(&self) -> BaselineRegistry {
        self.config.baseline_registry()
    }

    /// Load the configured target catalog and check it against the baselines.
    pub fn catalog(&self) -> Result<Catalog> {
        let path = self.layout.resolve(&self.config.catalog_path);
        let catalog = Catalog::load(&path)?;
        catalog.validate(&self.baselines())?;
        Ok(catalog)
    }

    /// Build the configured patch source.
    pub fn patch_source(&self) -> Result<Box<dyn PatchSource>> {
        match &self.config.store {
            PatchStoreConfig::Http { base_url } => {
                let source = HttpPatchSource::new(base_url).map_err(anyhow::Error::msg)?;
                Ok(Box::new(source))
            }
            PatchStoreConfig::Directory { path } => {
                Ok(Box::new(DirectoryPatchSource::new(self.layout.resolve(path))))
            }
        }
    }

    /// Spawn a diff engine backed by xdelta3.
    pub fn diff_engine(&self) -> Result<DiffEngine> {
        let backend = Xdelta3Backend::new(self.config.xdelta3_path.clone());
        DiffEngine::spawn(backend).context("Failed to start diff engine worker")
    }
}
