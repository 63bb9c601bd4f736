use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::hashing::Digest;
use crate::model::Region;

/// Pipeline step in which an error surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classify,
    Clean,
    VerifyClean,
    Transition,
    TargetPatch,
    FinalVerify,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Classify => "classify",
            Stage::Clean => "clean",
            Stage::VerifyClean => "verify-clean",
            Stage::Transition => "transition",
            Stage::TargetPatch => "target-patch",
            Stage::FinalVerify => "final-verify",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which digest gate failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityCheck {
    /// Cleaning did not converge on the region baseline.
    Clean,
    /// The region transition did not produce the target baseline.
    Transition,
    /// The patched image does not match the caller-supplied digest.
    Final,
}

impl fmt::Display for IntegrityCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntegrityCheck::Clean => "failed to clean ROM",
            IntegrityCheck::Transition => "failed to transition ROM region",
            IntegrityCheck::Final => "failed to patch ROM",
        })
    }
}

/// Transport key used when the failure belongs to the run as a whole.
pub const PIPELINE_KEY: &str = "pipeline";

/// Why the diff engine produced no output.
#[derive(Debug, Error)]
pub enum ApplyFailure {
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with {status}{}", stderr_suffix(.stderr))]
    ToolExit { tool: String, status: String, stderr: String },

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    /// Diagnostic reported by an in-process algorithm.
    #[error("{0}")]
    Algorithm(String),

    #[error("{algorithm} panicked while applying the diff")]
    Panicked { algorithm: &'static str },

    #[error("diff engine worker {0}")]
    WorkerUnavailable(&'static str),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

fn transport_message(key: &str, status: &Option<u16>, message: &str) -> String {
    if key == PIPELINE_KEY {
        return format!("Patch run {message}");
    }
    let status = status.map(|s| format!(" (code {s})")).unwrap_or_default();
    format!("Failed to fetch patch '{key}'{status}: {message}")
}

/// Every failure kind a patch run can end with.
///
/// The variant itself carries the user-actionable vs system distinction; see
/// [`PatchError::is_user_actionable`].
#[derive(Debug, Error)]
pub enum PatchError {
    /// Header region byte is outside the supported set.
    #[error(
        "The region of your ROM is not supported (region byte: {}). Only {supported} ROMs are currently supported.",
        .found.map(|b| format!("{:?}", b as char)).unwrap_or_else(|| "missing".to_string())
    )]
    UnsupportedRegion { found: Option<u8>, supported: String },

    /// No clean patch exists for this dump.
    #[error(
        "The provided ROM is incompatible. Please try again with a clean ROM. (Checksum of the provided ROM: \"{digest}\")"
    )]
    UnsupportedImage { digest: Digest },

    /// The store has no patch under this key.
    #[error("Patch '{key}' was not found in the patch store")]
    PatchNotFound { key: String },

    /// Connectivity failure, unexpected status, or unreadable local store.
    #[error("{}", transport_message(.key, .status, .message))]
    Transport { key: String, status: Option<u16>, message: String },

    /// Fetched bytes are not a VCDIFF patch.
    #[error("Patch '{key}' is corrupt: missing VCDIFF magic bytes")]
    CorruptPatch { key: String },

    /// The diff engine could not apply the patch.
    #[error("Failed to apply patch: {0}")]
    Apply(#[from] ApplyFailure),

    /// A digest gate did not match.
    #[error("{check} (checksum mismatch: {actual}, expected {expected})")]
    Integrity { check: IntegrityCheck, actual: Digest, expected: Digest },

    /// A region has no canonical digest configured.
    #[error("No baseline digest is configured for region '{region}'")]
    MissingBaseline { region: Region },
}

impl PatchError {
    /// The whole run exceeded a caller-imposed deadline.
    pub fn timed_out(limit: Duration) -> Self {
        PatchError::Transport {
            key: PIPELINE_KEY.to_string(),
            status: None,
            message: format!("timed out after {}s", limit.as_secs()),
        }
    }

    /// Errors the user can fix by supplying a different ROM.
    pub fn is_user_actionable(&self) -> bool {
        matches!(self, PatchError::UnsupportedRegion { .. } | PatchError::UnsupportedImage { .. })
    }

    /// The diff algorithm does not implement an instruction the patch uses.
    pub fn is_unsupported_patch(&self) -> bool {
        matches!(self, PatchError::Apply(failure) if failure.to_string().contains("not implemented"))
    }
}

/// A [`PatchError`] tagged with the stage it came from.
#[derive(Debug, Error)]
#[error("{stage}: {error}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub error: PatchError,
}

impl PipelineError {
    pub fn new(stage: Stage, error: PatchError) -> Self {
        Self { stage, error }
    }

    pub fn kind(&self) -> &PatchError {
        &self.error
    }
}
