//! Content digests used for image identity and integrity gates.
//!
//! SHA-1 is fixed: every baseline and every clean-patch key in the patch store
//! is expressed in it. Digests are only ever compared for equality.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::{Digest as _, Sha1};
use thiserror::Error;

/// Length of a SHA-1 digest in bytes.
pub const DIGEST_LEN: usize = 20;

/// A fixed-length content digest.
///
/// `Display` renders lower-case hex, which is the canonical string form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest([u8; DIGEST_LEN]);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DigestParseError {
    #[error("digest must be {expected} hex characters, got {found}")]
    Length { expected: usize, found: usize },
    #[error("digest contains a non-hex character: {0:?}")]
    NonHex(String),
}

impl Digest {
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Upper-case hex, the form used inside clean-patch keys.
    pub fn to_upper_hex(&self) -> String {
        format!("{self:X}")
    }
}

/// Compute the digest of a byte buffer.
pub fn digest(bytes: &[u8]) -> Digest {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    Digest(hasher.finalize().into())
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(self, f)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self:x})")
    }
}

impl fmt::LowerHex for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::UpperHex for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

/// Parsing accepts either case, since user-supplied digests are compared
/// case-insensitively.
impl FromStr for Digest {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != DIGEST_LEN * 2 {
            return Err(DigestParseError::Length { expected: DIGEST_LEN * 2, found: s.len() });
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DigestParseError::NonHex(s.to_string()));
        }

        let mut out = [0u8; DIGEST_LEN];
        for (i, slot) in out.iter_mut().enumerate() {
            let pair = &s[i * 2..i * 2 + 2];
            *slot =
                u8::from_str_radix(pair, 16).map_err(|_| DigestParseError::NonHex(s.to_string()))?;
        }
        Ok(Self(out))
    }
}

impl TryFrom<String> for Digest {
    type Error = DigestParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Digest> for String {
    fn from(value: Digest) -> Self {
        value.to_string()
    }
}
