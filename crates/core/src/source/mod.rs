//! Patch sources: resolve a [`PatchKey`] to validated diff bytes.
//!
//! Sources classify their own failures so the orchestrator can tell an
//! unsupported dump (not found) from a broken network or a broken store.

use async_trait::async_trait;

use crate::error::PatchError;
use crate::model::{Diff, PatchKey};

pub mod directory;
pub mod http;

pub use directory::DirectoryPatchSource;
pub use http::HttpPatchSource;

/// Trait implemented by patch stores (remote HTTP, local directory, test fakes).
#[async_trait]
pub trait PatchSource: Send + Sync {
    /// Fetch and validate the diff stored under `key`.
    async fn fetch(&self, key: &PatchKey) -> Result<Diff, PatchError>;

    fn name(&self) -> &'static str;
}

/// Map an HTTP-style status to the error taxonomy.
///
/// `404` means the store has no such patch; anything else non-2xx is a
/// transport failure carrying the code.
pub fn classify_status(key: &PatchKey, status: u16) -> Result<(), PatchError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(PatchError::PatchNotFound { key: key.to_string() }),
        other => Err(PatchError::Transport {
            key: key.to_string(),
            status: Some(other),
            message: "unexpected response status".to_string(),
        }),
    }
}
