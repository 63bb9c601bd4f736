//! Target catalog: the ROM hacks a workspace knows how to build.
//!
//! Catalogs are YAML or JSON lists, chosen by file extension:
//!
//! ```yaml
//! - id: chip2
//!   name: "PMD Chip 2: Apple Alliance"
//!   patch: ./xdelta/chip2.xdelta
//!   author: Miju
//!   region: us
//!   page: https://hacks.skytemple.org/h/chip2
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::baseline::BaselineRegistry;
use crate::hashing::Digest;
use crate::model::Region;
use crate::pipeline::PipelineRequest;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("Failed to parse catalog {path}: {message}")]
    Parse { path: String, message: String },
    #[error("Unsupported catalog format '{0}' (expected yaml, yml, or json)")]
    Format(String),
    #[error("Catalog entry {index}: {message}")]
    Invalid { index: usize, message: String },
    #[error("Unknown target '{id}'. Available: {available}")]
    UnknownTarget { id: String, available: String },
}

/// One ROM hack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    pub name: String,
    /// Patch location, relative to the patch store root or an absolute URL.
    pub patch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Region the patch was authored against.
    #[serde(default = "default_region")]
    pub region: Region,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// Expected digest of the patched ROM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<Digest>,
}

fn default_region() -> Region {
    Region::Us
}

impl Target {
    /// Pipeline request that produces this target.
    pub fn request(&self) -> PipelineRequest {
        PipelineRequest::target(self.patch.clone(), self.region).with_expected_digest(self.sha1)
    }

    /// Output file stem derived from the patch location, e.g. `chip2` for
    /// `./xdelta/chip2.xdelta`.
    pub fn file_stem(&self) -> String {
        file_stem_from_location(&self.patch)
    }

    pub fn display_name(&self) -> String {
        match &self.author {
            Some(author) => format!("{} (by {author})", self.name),
            None => self.name.clone(),
        }
    }
}

/// Last path segment without its extension.
pub fn file_stem_from_location(location: &str) -> String {
    let last = location.rsplit('/').next().unwrap_or(location);
    match last.rfind('.') {
        Some(idx) if idx > 0 => last[..idx].to_string(),
        _ => last.to_string(),
    }
}

/// Hacks published on the default patch store, as `(id, name, patch, author)`.
const PUBLISHED_TARGETS: [(&str, &str, &str, &str); 5] = [
    ("chip2", "PMD Chip 2: Apple Alliance", "./xdelta/chip2.xdelta", "Miju"),
    (
        "blorg",
        "BLORG",
        "./xdelta/PMD_BLORG_HOTY-Edition-2022.xdelta",
        "Mattshark and NikolaP",
    ),
    (
        "strungupbysketches",
        "Strung Up By Sketches",
        "./xdelta/SKETCHES.xdelta",
        "Adex, Irdkwia, and techticks",
    ),
    (
        "merchants",
        "Merchants Versus Pirates!",
        "./xdelta/MerchantsVsPirates1.2.xdelta",
        "FunnyKecleonMeme",
    ),
    (
        "nymblesstory",
        "Nymble's Story",
        "xdelta/Nymble's Story v1.2.1.xdelta",
        "J.L. Polybo, Axcel, shimxshimx, and JaiFain",
    ),
];

/// Ordered list of targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    pub targets: Vec<Target>,
}

impl Catalog {
    pub fn new(targets: Vec<Target>) -> Self {
        Self { targets }
    }

    /// Catalog of the hacks available on the default patch store. All of
    /// them target the US region.
    pub fn published() -> Self {
        let targets = PUBLISHED_TARGETS
            .iter()
            .map(|(id, name, patch, author)| Target {
                id: id.to_string(),
                name: name.to_string(),
                patch: patch.to_string(),
                author: Some(author.to_string()),
                region: Region::Us,
                page: Some(format!("https://hacks.skytemple.org/h/{id}")),
                sha1: None,
            })
            .collect();
        Self { targets }
    }

    /// Load a catalog from a `.yaml`, `.yml`, or `.json` file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let display = path.display().to_string();
        let body = std::fs::read_to_string(path)
            .map_err(|source| CatalogError::Io { path: display.clone(), source })?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        Self::parse(&body, ext).map_err(|e| match e {
            CatalogError::Parse { message, .. } => CatalogError::Parse { path: display, message },
            other => other,
        })
    }

    /// Parse catalog text in the format named by `ext`.
    pub fn parse(body: &str, ext: &str) -> Result<Self, CatalogError> {
        let parse_err = |message: String| CatalogError::Parse { path: String::new(), message };
        match ext {
            "yaml" | "yml" => serde_yaml::from_str(body).map_err(|e| parse_err(e.to_string())),
            "json" => serde_json::from_str(body).map_err(|e| parse_err(e.to_string())),
            other => Err(CatalogError::Format(other.to_string())),
        }
    }

    /// Reject empty fields, duplicate ids, and regions without a baseline.
    pub fn validate(&self, baselines: &BaselineRegistry) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for (index, target) in self.targets.iter().enumerate() {
            let invalid = |message: String| CatalogError::Invalid { index, message };
            if target.id.trim().is_empty() {
                return Err(invalid("id is required".to_string()));
            }
            if target.patch.trim().is_empty() {
                return Err(invalid(format!("patch is required for '{}'", target.id)));
            }
            if !seen.insert(target.id.as_str()) {
                return Err(invalid(format!("duplicate id '{}'", target.id)));
            }
            if !baselines.contains(target.region) {
                return Err(invalid(format!(
                    "'{}' targets region {} which has no baseline",
                    target.id, target.region
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&Target, CatalogError> {
        self.targets.iter().find(|t| t.id == id).ok_or_else(|| CatalogError::UnknownTarget {
            id: id.to_string(),
            available: self.targets.iter().map(|t| t.id.as_str()).collect::<Vec<_>>().join(", "),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
- id: chip2
  name: "PMD Chip 2: Apple Alliance"
  patch: ./xdelta/chip2.xdelta
  author: Miju
  region: us
  page: https://hacks.skytemple.org/h/chip2
- id: nymblesstory
  name: "Nymble's Story"
  patch: "xdelta/Nymble's Story v1.2.1.xdelta"
"#;

    #[test]
    fn parses_yaml_with_defaults() {
        let catalog = Catalog::parse(YAML, "yaml").unwrap();
        assert_eq!(catalog.len(), 2);
        let nymble = catalog.get("nymblesstory").unwrap();
        assert_eq!(nymble.region, Region::Us);
        assert_eq!(nymble.author, None);
        assert_eq!(nymble.file_stem(), "Nymble's Story v1.2.1");
        assert_eq!(catalog.get("chip2").unwrap().display_name(), "PMD Chip 2: Apple Alliance (by Miju)");
        catalog.validate(&BaselineRegistry::default()).unwrap();
    }

    #[test]
    fn parses_json() {
        let json = r#"[{"id":"blorg","name":"BLORG","patch":"xdelta/blorg.xdelta","region":"eu"}]"#;
        let catalog = Catalog::parse(json, "json").unwrap();
        assert_eq!(catalog.targets[0].region, Region::Eu);
    }

    #[test]
    fn unknown_target_lists_available() {
        let catalog = Catalog::parse(YAML, "yml").unwrap();
        let err = catalog.get("missing").unwrap_err();
        assert!(err.to_string().contains("chip2, nymblesstory"));
    }

    #[test]
    fn validation_rejects_duplicates_and_unbaselined_regions() {
        let mut catalog = Catalog::parse(YAML, "yaml").unwrap();
        catalog.targets[1].id = "chip2".into();
        assert!(catalog.validate(&BaselineRegistry::default()).unwrap_err().to_string().contains("duplicate"));

        let mut catalog = Catalog::parse(YAML, "yaml").unwrap();
        catalog.targets[0].region = Region::Jp;
        assert!(catalog.validate(&BaselineRegistry::default()).is_err());
    }

    #[test]
    fn file_stem_handles_plain_names() {
        assert_eq!(file_stem_from_location("hack"), "hack");
        assert_eq!(file_stem_from_location("https://x.org/a/b.xdelta"), "b");
    }

    #[test]
    fn published_catalog_is_valid_and_round_trips_through_yaml() {
        let catalog = Catalog::published();
        catalog.validate(&BaselineRegistry::default()).unwrap();
        assert_eq!(catalog.get("blorg").unwrap().file_stem(), "PMD_BLORG_HOTY-Edition-2022");

        let yaml = serde_yaml::to_string(&catalog).unwrap();
        assert_eq!(Catalog::parse(&yaml, "yaml").unwrap(), catalog);
    }

    #[test]
    fn rejects_unknown_extension() {
        assert!(matches!(Catalog::parse("[]", "toml"), Err(CatalogError::Format(_))));
    }
}
