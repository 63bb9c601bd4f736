use serde::{Deserialize, Serialize};

use crate::model::Image;

/// Cache key under which the last accepted source ROM is stored.
pub const SOURCE_ROM_KEY: &str = "rom";

/// An image stored in the cache, with its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedImage {
    /// Display name, usually the original file name.
    pub name: String,
    pub image: Image,
    /// RFC 3339 timestamp of when the entry was written.
    pub stored_at: String,
}

impl CachedImage {
    pub fn new(name: impl Into<String>, image: Image) -> Self {
        Self { name: name.into(), image, stored_at: chrono::Utc::now().to_rfc3339() }
    }
}

/// Listing view of a cache entry (no payload).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntrySummary {
    pub key: String,
    pub name: String,
    pub len: u64,
    pub digest: String,
    pub stored_at: String,
}

/// A save file persisted for one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveEntry {
    pub target: String,
    pub name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub stored_at: String,
}
