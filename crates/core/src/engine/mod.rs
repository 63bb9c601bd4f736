//! Diff engine: applies binary diffs off the caller's execution context.
//!
//! The engine owns a dedicated worker thread. Callers talk to it only through
//! a request channel and a response channel; every request carries a fresh
//! [`InvocationId`] and the caller waits for the response bearing that id.
//! Responses with any other id belong to a request whose caller gave up (for
//! example after an external timeout) and are discarded.
//!
//! The diff algorithm itself is opaque and pluggable via [`DiffAlgorithm`].

use std::fmt;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{ApplyFailure, PatchError};
use crate::model::{Diff, Image};

pub mod xdelta3;

pub use xdelta3::Xdelta3Backend;

/// The opaque `apply(base, diff) -> output` capability.
///
/// Implementations run on the engine's worker thread and may block.
pub trait DiffAlgorithm: Send + Sync + 'static {
    /// Apply `diff` to `base`. Errors keep the algorithm's diagnostic text.
    fn apply(&self, base: &[u8], diff: &[u8]) -> Result<Vec<u8>, ApplyFailure>;

    fn name(&self) -> &'static str;
}

/// Correlation value for one engine request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvocationId(Uuid);

impl InvocationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug)]
struct ApplyRequest {
    id: InvocationId,
    base: Image,
    diff: Diff,
}

#[derive(Debug)]
struct ApplyResponse {
    id: InvocationId,
    outcome: Result<Vec<u8>, ApplyFailure>,
}

/// Handle to the isolated diff worker.
///
/// Dropping the handle closes the request channel; the worker finishes the
/// request it is processing (if any) and exits.
pub struct DiffEngine {
    algorithm: &'static str,
    requests: UnboundedSender<ApplyRequest>,
    responses: Mutex<UnboundedReceiver<ApplyResponse>>,
}

impl DiffEngine {
    /// Spawn the worker thread for `algorithm`.
    pub fn spawn<A: DiffAlgorithm>(algorithm: A) -> io::Result<Self> {
        Self::spawn_shared(Arc::new(algorithm))
    }

    pub fn spawn_shared(algorithm: Arc<dyn DiffAlgorithm>) -> io::Result<Self> {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let name = algorithm.name();

        thread::Builder::new()
            .name("diff-engine".to_string())
            .spawn(move || worker_loop(algorithm, request_rx, response_tx))?;

        Ok(Self { algorithm: name, requests: request_tx, responses: Mutex::new(response_rx) })
    }

    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm
    }

    /// Apply `diff` to `base` on the worker and wait for the matching result.
    ///
    /// Only one request is in flight per engine at a time; concurrent callers
    /// queue on the response lock. Failures come back as
    /// [`PatchError::Apply`]; nothing is retried.
    pub async fn apply(&self, base: Image, diff: Diff) -> Result<Image, PatchError> {
        let mut responses = self.responses.lock().await;
        let id = InvocationId::new();
        tracing::debug!(%id, base_len = base.len(), diff_len = diff.len(), "dispatching diff");

        self.requests
            .send(ApplyRequest { id, base, diff })
            .map_err(|_| ApplyFailure::WorkerUnavailable("has shut down"))?;

        let response = await_response(&mut responses, id).await?;
        Ok(Image::from(response.outcome?))
    }
}

impl fmt::Debug for DiffEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffEngine").field("algorithm", &self.algorithm).finish()
    }
}

/// Wait for the response tagged `id`, discarding stale ones.
async fn await_response(
    responses: &mut UnboundedReceiver<ApplyResponse>,
    id: InvocationId,
) -> Result<ApplyResponse, PatchError> {
    loop {
        match responses.recv().await {
            Some(response) if response.id == id => return Ok(response),
            Some(stale) => {
                tracing::warn!(stale = %stale.id, expected = %id, "discarding stale diff engine response");
            }
            None => {
                return Err(ApplyFailure::WorkerUnavailable("stopped before responding").into())
            }
        }
    }
}

fn worker_loop(
    algorithm: Arc<dyn DiffAlgorithm>,
    mut requests: UnboundedReceiver<ApplyRequest>,
    responses: UnboundedSender<ApplyResponse>,
) {
    while let Some(request) = requests.blocking_recv() {
        tracing::debug!(id = %request.id, algorithm = algorithm.name(), "applying diff");
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            algorithm.apply(request.base.as_bytes(), request.diff.as_bytes())
        }))
        .unwrap_or_else(|_| Err(ApplyFailure::Panicked { algorithm: algorithm.name() }));

        if responses.send(ApplyResponse { id: request.id, outcome }).is_err() {
            break;
        }
    }
}
