//! Canonical ("clean", unmodified) digests per region.

use std::collections::BTreeMap;

use crate::hashing::Digest;
use crate::model::Region;

/// SHA-1 of the clean US dump.
pub const CLEAN_US_SHA1: &str = "5fa96ca8d8dd6405d6cd2bad73ed68bc73a9d152";
/// SHA-1 of the clean EU dump.
pub const CLEAN_EU_SHA1: &str = "c838a5adf1ed32d2da8454976e5b1a1aa189c139";

/// Region -> expected digest. Fixed once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineRegistry {
    entries: BTreeMap<Region, Digest>,
}

impl BaselineRegistry {
    pub fn new(entries: impl IntoIterator<Item = (Region, Digest)>) -> Self {
        Self { entries: entries.into_iter().collect() }
    }

    /// Built-in baselines, extended or overridden by `overrides`.
    pub fn with_overrides(overrides: &BTreeMap<Region, Digest>) -> Self {
        let mut registry = Self::default();
        registry.entries.extend(overrides.iter().map(|(r, d)| (*r, *d)));
        registry
    }

    pub fn expected_digest(&self, region: Region) -> Option<&Digest> {
        self.entries.get(&region)
    }

    pub fn contains(&self, region: Region) -> bool {
        self.entries.contains_key(&region)
    }

    pub fn regions(&self) -> Vec<Region> {
        self.entries.keys().copied().collect()
    }

    /// Region whose baseline equals `digest`, if any.
    pub fn region_of(&self, digest: &Digest) -> Option<Region> {
        self.entries.iter().find(|(_, d)| *d == digest).map(|(r, _)| *r)
    }
}

impl Default for BaselineRegistry {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        if let Ok(us) = CLEAN_US_SHA1.parse() {
            entries.insert(Region::Us, us);
        }
        if let Ok(eu) = CLEAN_EU_SHA1.parse() {
            entries.insert(Region::Eu, eu);
        }
        Self { entries }
    }
}
