//! Core value types: images, regions, diffs, and patch lookup keys.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::PatchError;
use crate::hashing::{digest, Digest};

/// Magic bytes every VCDIFF (xdelta3) patch starts with.
pub const DIFF_MAGIC: [u8; 3] = [0xD6, 0xC3, 0xC4];

/// Offset of the VCDIFF header indicator byte.
pub const DIFF_HDR_INDICATOR_OFFSET: usize = 4;

/// Header indicator bit set when a secondary compressor is used.
pub const VCD_DECOMPRESS: u8 = 0x01;

/// Cartridge region, derived from the ROM header game code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Us,
    Eu,
    Jp,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::Us, Region::Eu, Region::Jp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Eu => "eu",
            Region::Jp => "jp",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" => Ok(Region::Us),
            "eu" => Ok(Region::Eu),
            "jp" => Ok(Region::Jp),
            other => Err(format!("Unknown region '{other}'. Allowed: us, eu, jp")),
        }
    }
}

/// An immutable ROM image.
///
/// Cloning is cheap; every transformation produces a new `Image`.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    bytes: Arc<[u8]>,
}

impl Image {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self { bytes: bytes.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn digest(&self) -> Digest {
        digest(&self.bytes)
    }

    /// True when both handles point at the same allocation.
    pub fn shares_buffer(&self, other: &Image) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl From<Vec<u8>> for Image {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image").field("len", &self.bytes.len()).finish()
    }
}

/// A validated binary diff.
///
/// Construction checks the VCDIFF magic; the remaining bytes are opaque.
#[derive(Clone, PartialEq, Eq)]
pub struct Diff {
    bytes: Arc<[u8]>,
}

impl Diff {
    /// Validate `bytes` fetched for `key` and wrap them.
    pub fn parse(key: &PatchKey, bytes: impl Into<Arc<[u8]>>) -> Result<Self, PatchError> {
        let bytes = bytes.into();
        if !bytes.starts_with(&DIFF_MAGIC) {
            return Err(PatchError::CorruptPatch { key: key.to_string() });
        }
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the header indicator advertises a secondary compressor.
    pub fn uses_secondary_compression(&self) -> bool {
        self.bytes
            .get(DIFF_HDR_INDICATOR_OFFSET)
            .map(|b| b & VCD_DECOMPRESS != 0)
            .unwrap_or(false)
    }
}

impl fmt::Debug for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diff").field("len", &self.bytes.len()).finish()
    }
}

/// Logical identity of a patch in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatchKey {
    /// Cleans an image of `region` whose current digest is `digest`.
    Clean { region: Region, digest: Digest },
    /// Converts a clean image of `from` into a clean image of `to`.
    Transition { from: Region, to: Region },
    /// A hack patch, addressed by relative path or absolute URL.
    Target { location: String },
}

impl PatchKey {
    /// Path of the patch relative to the store root.
    pub fn resource_path(&self) -> String {
        match self {
            PatchKey::Clean { .. } | PatchKey::Transition { .. } => {
                format!("patches/{self}.xdelta")
            }
            PatchKey::Target { location } => {
                location.trim_start_matches("./").to_string()
            }
        }
    }
}

impl fmt::Display for PatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchKey::Clean { region, digest } => {
                write!(f, "{region}/from/{}", digest.to_upper_hex())
            }
            PatchKey::Transition { from, to } => write!(f, "{from}-to-{to}"),
            PatchKey::Target { location } => f.write_str(location),
        }
    }
}
