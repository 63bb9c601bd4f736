use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::PatchError;
use crate::model::{Diff, PatchKey};
use crate::source::PatchSource;

/// Patch store laid out on the local filesystem.
///
/// Mirrors the remote layout: `patches/<region>/from/<DIGEST>.xdelta`,
/// `patches/<a>-to-<b>.xdelta`, and target patches at their relative path.
#[derive(Debug, Clone)]
pub struct DirectoryPatchSource {
    root: PathBuf,
}

impl DirectoryPatchSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for `key` (absolute target locations are used as-is).
    pub fn path_for(&self, key: &PatchKey) -> PathBuf {
        let rel = key.resource_path();
        let candidate = Path::new(&rel);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        }
    }
}

#[async_trait]
impl PatchSource for DirectoryPatchSource {
    async fn fetch(&self, key: &PatchKey) -> Result<Diff, PatchError> {
        let path = self.path_for(key);
        tracing::debug!(%key, path = %path.display(), "reading patch from directory store");

        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => PatchError::PatchNotFound { key: key.to_string() },
            _ => PatchError::Transport {
                key: key.to_string(),
                status: None,
                message: format!("failed to read {}: {e}", path.display()),
            },
        })?;
        Diff::parse(key, bytes)
    }

    fn name(&self) -> &'static str {
        "directory"
    }
}
