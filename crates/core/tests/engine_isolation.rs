// crates/core/tests/engine_isolation.rs

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{replace_diff, rom, FailingAlgorithm, ReplaceAlgorithm};
use rompatch_core::engine::{DiffAlgorithm, DiffEngine};
use rompatch_core::model::DIFF_MAGIC;
use rompatch_core::{ApplyFailure, Diff, Image, PatchError, PatchKey};

/// Replays the diff payload, sleeping first when the payload's first byte is 0xFF.
struct SlowAlgorithm;

impl DiffAlgorithm for SlowAlgorithm {
    fn apply(&self, _base: &[u8], diff: &[u8]) -> Result<Vec<u8>, ApplyFailure> {
        let payload = &diff[DIFF_MAGIC.len()..];
        if payload.first() == Some(&0xFF) {
            std::thread::sleep(Duration::from_millis(300));
        }
        Ok(payload.to_vec())
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

fn diff_for(output: &Image) -> Diff {
    let key = PatchKey::Target { location: "test.xdelta".into() };
    Diff::parse(&key, replace_diff(output)).expect("valid diff")
}

#[tokio::test]
async fn abandoned_request_never_resolves_the_next_one() {
    let engine = DiffEngine::spawn(SlowAlgorithm).expect("spawn engine");
    let base = rom(b'E', 0);
    let slow_out = Image::from(vec![0xFF; 8]);
    let fast_out = Image::from(vec![0x01; 8]);

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        engine.apply(base.clone(), diff_for(&slow_out)),
    )
    .await;
    assert!(abandoned.is_err(), "slow request should time out");

    // The slow response is still queued ahead of this one and must be dropped.
    let out = engine.apply(base, diff_for(&fast_out)).await.expect("apply");
    assert_eq!(out, fast_out);
}

#[tokio::test]
async fn concurrent_callers_each_get_their_own_result() {
    let (algo, _) = ReplaceAlgorithm::new();
    let engine = Arc::new(DiffEngine::spawn(algo).expect("spawn engine"));
    let base = rom(b'E', 0);

    let mut handles = Vec::new();
    for fill in 0..8u8 {
        let engine = engine.clone();
        let base = base.clone();
        handles.push(tokio::spawn(async move {
            let expected = Image::from(vec![fill; 16]);
            let out = engine.apply(base, diff_for(&expected)).await.expect("apply");
            (expected, out)
        }));
    }

    for handle in handles {
        let (expected, out) = handle.await.expect("join");
        assert_eq!(out, expected);
    }
}

#[tokio::test]
async fn algorithm_failure_is_an_apply_error() {
    let engine = DiffEngine::spawn(FailingAlgorithm("target window checksum mismatch"))
        .expect("spawn engine");
    assert_eq!(engine.algorithm_name(), "failing");

    let err = engine.apply(rom(b'E', 0), diff_for(&rom(b'E', 1))).await.unwrap_err();
    match err {
        PatchError::Apply(failure) => assert!(failure.to_string().contains("checksum mismatch")),
        other => panic!("expected Apply, got {other:?}"),
    }
}

struct PanickingAlgorithm;

impl DiffAlgorithm for PanickingAlgorithm {
    fn apply(&self, _base: &[u8], _diff: &[u8]) -> Result<Vec<u8>, ApplyFailure> {
        panic!("boom");
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

#[tokio::test]
async fn panicking_algorithm_does_not_take_down_the_worker() {
    let engine = DiffEngine::spawn(PanickingAlgorithm).expect("spawn engine");

    for _ in 0..2 {
        let err = engine.apply(rom(b'E', 0), diff_for(&rom(b'E', 1))).await.unwrap_err();
        assert!(matches!(err, PatchError::Apply(ApplyFailure::Panicked { algorithm: "panicking" })));
        assert!(err.to_string().contains("panicked"));
    }
}
