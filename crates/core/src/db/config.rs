use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::baseline::BaselineRegistry;
use crate::hashing::Digest;
use crate::model::Region;

/// Default public patch store.
pub const DEFAULT_PATCH_STORE_URL: &str = "https://hacks.skytemple.org/player/";

/// Where patches are fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PatchStoreConfig {
    /// Remote store addressed by base URL.
    Http { base_url: String },
    /// Local directory with the same layout as the remote store.
    Directory { path: String },
}

impl Default for PatchStoreConfig {
    fn default() -> Self {
        PatchStoreConfig::Http { base_url: DEFAULT_PATCH_STORE_URL.to_string() }
    }
}

/// Serializable configuration describing a patcher workspace.
///
/// This lives at `.rompatch/config.json` in the workspace root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatcherConfig {
    /// Human-friendly workspace name.
    pub name: String,
    /// Schema/config version. This is about the config format, not ROM versions.
    pub config_version: String,
    /// Patch store location.
    #[serde(default)]
    pub store: PatchStoreConfig,
    /// Path to the cache database (typically relative to the workspace root).
    pub cache_path: String,
    /// Path to the target catalog (YAML or JSON).
    pub catalog_path: String,
    /// Extra or overriding baseline digests, e.g. for JP dumps.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub baselines: BTreeMap<Region, Digest>,
    /// Optional explicit xdelta3 executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xdelta3_path: Option<PathBuf>,
}

impl PatcherConfig {
    /// Create a new configuration using the given name and paths.
    pub fn new(
        name: impl Into<String>,
        cache_path: impl Into<String>,
        catalog_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            config_version: "0.1.0".to_string(),
            store: PatchStoreConfig::default(),
            cache_path: cache_path.into(),
            catalog_path: catalog_path.into(),
            baselines: BTreeMap::new(),
            xdelta3_path: None,
        }
    }

    /// Builder-style helper to select the patch store.
    pub fn with_store(mut self, store: PatchStoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Baseline registry: built-ins plus configured overrides.
    pub fn baseline_registry(&self) -> BaselineRegistry {
        BaselineRegistry::with_overrides(&self.baselines)
    }
}
