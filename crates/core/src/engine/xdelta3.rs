use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::NamedTempFile;

use crate::engine::DiffAlgorithm;
use crate::error::ApplyFailure;

/// VCDIFF decoding through the external `xdelta3` tool.
///
/// The executable is taken from the configured path, then `XDELTA3_BIN`,
/// then `xdelta3` on `PATH`.
#[derive(Debug, Clone)]
pub struct Xdelta3Backend {
    bin: PathBuf,
}

impl Xdelta3Backend {
    pub fn new(bin: Option<PathBuf>) -> Self {
        Self { bin: bin.unwrap_or_else(resolve_xdelta3_path) }
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// First line of `xdelta3 -V` (printed on stderr by most builds).
    pub fn version(&self) -> Result<String, ApplyFailure> {
        let output = Command::new(&self.bin).arg("-V").output().map_err(|e| self.spawn_failure(e))?;
        let text = if output.stdout.is_empty() { output.stderr } else { output.stdout };
        let first = String::from_utf8_lossy(&text).lines().next().unwrap_or("").trim().to_string();
        if first.is_empty() {
            Err(ApplyFailure::Algorithm("xdelta3 -V produced no output".to_string()))
        } else {
            Ok(first)
        }
    }

    /// Encode `target` against `base` without secondary compression.
    pub fn encode(&self, base: &[u8], target: &[u8]) -> Result<Vec<u8>, ApplyFailure> {
        let base_file = write_temp(base)?;
        let target_file = write_temp(target)?;
        self.run(&["-e", "-S", "none", "-c", "-s"], base_file.path(), target_file.path())
    }

    fn run(&self, flags: &[&str], source: &Path, input: &Path) -> Result<Vec<u8>, ApplyFailure> {
        let output = Command::new(&self.bin)
            .args(flags)
            .arg(source)
            .arg(input)
            .output()
            .map_err(|e| self.spawn_failure(e))?;
        if !output.status.success() {
            return Err(ApplyFailure::ToolExit {
                tool: "xdelta3".to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    fn spawn_failure(&self, source: std::io::Error) -> ApplyFailure {
        ApplyFailure::Spawn { tool: self.bin.display().to_string(), source }
    }
}

impl Default for Xdelta3Backend {
    fn default() -> Self {
        Self::new(None)
    }
}

impl DiffAlgorithm for Xdelta3Backend {
    fn apply(&self, base: &[u8], diff: &[u8]) -> Result<Vec<u8>, ApplyFailure> {
        let base_file = write_temp(base)?;
        let diff_file = write_temp(diff)?;
        self.run(&["-d", "-c", "-s"], base_file.path(), diff_file.path())
    }

    fn name(&self) -> &'static str {
        "xdelta3"
    }
}

fn resolve_xdelta3_path() -> PathBuf {
    std::env::var_os("XDELTA3_BIN").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("xdelta3"))
}

fn write_temp(bytes: &[u8]) -> Result<NamedTempFile, ApplyFailure> {
    let mut file = NamedTempFile::new().map_err(io_failure("failed to create temporary file"))?;
    file.write_all(bytes).map_err(io_failure("failed to write temporary file"))?;
    file.flush().map_err(io_failure("failed to flush temporary file"))?;
    Ok(file)
}

fn io_failure(context: &'static str) -> impl FnOnce(std::io::Error) -> ApplyFailure {
    move |source| ApplyFailure::Io { context, source }
}
