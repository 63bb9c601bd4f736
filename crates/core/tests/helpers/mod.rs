#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rompatch_core::baseline::BaselineRegistry;
use rompatch_core::engine::DiffAlgorithm;
use rompatch_core::model::DIFF_MAGIC;
use rompatch_core::source::PatchSource;
use rompatch_core::{digest, ApplyFailure, Diff, Image, PatchError, PatchKey, Region};

/// Header game-code region byte offset.
pub const REGION_OFFSET: usize = 0x0F;

/// Small fake ROM with the given region code and filler byte.
pub fn rom(code: u8, fill: u8) -> Image {
    let mut bytes = vec![fill; 64];
    bytes[REGION_OFFSET] = code;
    Image::from(bytes)
}

/// Diff payload that tells [`ReplaceAlgorithm`] to output `output`.
pub fn replace_diff(output: &Image) -> Vec<u8> {
    let mut bytes = DIFF_MAGIC.to_vec();
    bytes.extend_from_slice(output.as_bytes());
    bytes
}

/// Diff algorithm whose "diff" is the magic followed by the output bytes.
#[derive(Default)]
pub struct ReplaceAlgorithm {
    pub calls: Arc<AtomicUsize>,
}

impl ReplaceAlgorithm {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { calls: calls.clone() }, calls)
    }
}

impl DiffAlgorithm for ReplaceAlgorithm {
    fn apply(&self, _base: &[u8], diff: &[u8]) -> Result<Vec<u8>, ApplyFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(diff[DIFF_MAGIC.len()..].to_vec())
    }

    fn name(&self) -> &'static str {
        "replace"
    }
}

/// Algorithm that always fails with a fixed diagnostic.
pub struct FailingAlgorithm(pub &'static str);

impl DiffAlgorithm for FailingAlgorithm {
    fn apply(&self, _base: &[u8], _diff: &[u8]) -> Result<Vec<u8>, ApplyFailure> {
        Err(ApplyFailure::Algorithm(self.0.to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// In-memory patch store that records every key it is asked for.
#[derive(Default)]
pub struct MemorySource {
    patches: HashMap<String, Vec<u8>>,
    failures: HashMap<String, fn(&PatchKey) -> PatchError>,
    pub fetched: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patch(mut self, key: PatchKey, bytes: Vec<u8>) -> Self {
        self.patches.insert(key.to_string(), bytes);
        self
    }

    pub fn with_failure(mut self, key: PatchKey, make: fn(&PatchKey) -> PatchError) -> Self {
        self.failures.insert(key.to_string(), make);
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl PatchSource for MemorySource {
    async fn fetch(&self, key: &PatchKey) -> Result<Diff, PatchError> {
        let name = key.to_string();
        self.fetched.lock().unwrap().push(name.clone());
        if let Some(make) = self.failures.get(&name) {
            return Err(make(key));
        }
        match self.patches.get(&name) {
            Some(bytes) => Diff::parse(key, bytes.clone()),
            None => Err(PatchError::PatchNotFound { key: name }),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Clean US and EU images plus a registry pinned to their digests.
pub struct Fixture {
    pub clean_us: Image,
    pub clean_eu: Image,
    pub baselines: BaselineRegistry,
}

impl Fixture {
    pub fn new() -> Self {
        let clean_us = rom(b'E', 0x11);
        let clean_eu = rom(b'P', 0x22);
        let mut entries = BTreeMap::new();
        entries.insert(Region::Us, digest(clean_us.as_bytes()));
        entries.insert(Region::Eu, digest(clean_eu.as_bytes()));
        Self { clean_us, clean_eu, baselines: BaselineRegistry::new(entries) }
    }
}
