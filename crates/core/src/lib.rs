//! rompatch-core
//!
//! Core library for turning an arbitrary ROM dump into a known-good patched
//! image: region detection, checksum-gated cleaning to a canonical baseline,
//! region transition, target (hack) patch application, and end-to-end
//! verification.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends (CLI today, possibly a web worker or GUI later).

pub mod baseline;
pub mod catalog;
pub mod db;
pub mod engine;
pub mod error;
pub mod hashing;
pub mod model;
pub mod pipeline;
pub mod region;
pub mod save;
pub mod source;

pub use error::{ApplyFailure, PatchError, PipelineError, Stage};
pub use hashing::{digest, Digest};
pub use model::{Diff, Image, PatchKey, Region};
pub use pipeline::{Pipeline, PipelineRequest};

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
