//! Recording engine for tests.
//!
//! `TestEngine` records every adapter call into an ordered log and keeps a
//! simulated image of the engine: live sources, one parameter object per mix
//! channel (patched with absolute-value semantics), and the global playback
//! object. Timing is scripted; faults can be injected.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use repsys_types::{MixTrackId, SampleBuffer, TimingState, TrackId};

use crate::{EngineAdapter, EngineError, EngineResult, Patch};

/// An adapter call recorded by `TestEngine`.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOp {
    Init(PathBuf),
    Start,
    AddSource { id: TrackId, frames: usize },
    RemoveSource(TrackId),
    SetMixTrack { id: MixTrackId, patch: Patch },
    RemoveMixTrack(MixTrackId),
    UpdatePlayback(Patch),
    GetTiming,
}

impl EngineOp {
    /// True for calls that change engine state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            EngineOp::AddSource { .. }
                | EngineOp::RemoveSource(_)
                | EngineOp::SetMixTrack { .. }
                | EngineOp::RemoveMixTrack(_)
                | EngineOp::UpdatePlayback(_)
        )
    }
}

#[derive(Default)]
struct Inner {
    ops: Vec<EngineOp>,
    initialized: bool,
    running: bool,
    sources: BTreeMap<TrackId, SampleBuffer>,
    channels: BTreeMap<MixTrackId, Value>,
    playback: Value,
    timing: TimingState,
    /// Calls left before the injected failure, and the failure.
    fail_at: Option<(usize, EngineError)>,
    unreachable: bool,
}

/// A test engine that records all operations for assertions.
/// Uses `Mutex` for interior mutability so it is `Send + Sync` and can be
/// shared as `Arc<TestEngine>` between the reconciler and the test.
#[derive(Default)]
pub struct TestEngine {
    inner: Mutex<Inner>,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine that has already seen `init` and `start`, with an empty log.
    pub fn started() -> Self {
        let engine = Self::new();
        {
            let mut inner = engine.inner();
            inner.initialized = true;
            inner.running = true;
        }
        engine
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All recorded operations, in call order.
    pub fn operations(&self) -> Vec<EngineOp> {
        self.inner().ops.clone()
    }

    /// Recorded operations that change engine state.
    pub fn mutations(&self) -> Vec<EngineOp> {
        self.inner()
            .ops
            .iter()
            .filter(|op| op.is_mutation())
            .cloned()
            .collect()
    }

    /// Clear the operation log (the simulated image is kept).
    pub fn clear(&self) {
        self.inner().ops.clear();
    }

    /// Count operations matching a predicate.
    pub fn count<F: Fn(&EngineOp) -> bool>(&self, f: F) -> usize {
        self.inner().ops.iter().filter(|op| f(op)).count()
    }

    /// Find the first operation matching a predicate.
    pub fn find<F: Fn(&EngineOp) -> bool>(&self, f: F) -> Option<EngineOp> {
        self.inner().ops.iter().find(|op| f(op)).cloned()
    }

    /// Position of the first operation matching a predicate.
    pub fn position<F: Fn(&EngineOp) -> bool>(&self, f: F) -> Option<usize> {
        self.inner().ops.iter().position(|op| f(op))
    }

    /// Current parameter object of a mix channel.
    pub fn channel_state(&self, id: &MixTrackId) -> Option<Value> {
        self.inner().channels.get(id).cloned()
    }

    /// Current global playback object.
    pub fn playback_state(&self) -> Value {
        self.inner().playback.clone()
    }

    pub fn live_sources(&self) -> Vec<TrackId> {
        self.inner().sources.keys().cloned().collect()
    }

    pub fn live_channels(&self) -> Vec<MixTrackId> {
        self.inner().channels.keys().cloned().collect()
    }

    pub fn is_running(&self) -> bool {
        self.inner().running
    }

    /// Script the value returned by the next `get_timing` calls.
    pub fn set_timing(&self, timing: TimingState) {
        self.inner().timing = timing;
    }

    /// Fail the next call (of any kind) with `err`.
    pub fn fail_next(&self, err: EngineError) {
        self.fail_after(0, err);
    }

    /// Let `calls` calls succeed, then fail the one after with `err`.
    pub fn fail_after(&self, calls: usize, err: EngineError) {
        self.inner().fail_at = Some((calls, err));
    }

    /// While set, every call fails with `EngineError::Unreachable`.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner().unreachable = unreachable;
    }

    /// Record `op`, then run the fault checks. Returns the locked state for
    /// the caller to apply the call's effect.
    fn enter(&self, op: EngineOp, needs_init: bool) -> EngineResult<MutexGuard<'_, Inner>> {
        let mut inner = self.inner();
        inner.ops.push(op);
        if inner.unreachable {
            return Err(EngineError::Unreachable("test engine marked unreachable".into()));
        }
        match inner.fail_at.take() {
            Some((0, err)) => return Err(err),
            Some((n, err)) => inner.fail_at = Some((n - 1, err)),
            None => {}
        }
        if needs_init && !inner.initialized {
            return Err(EngineError::NotInitialized);
        }
        Ok(inner)
    }
}

impl EngineAdapter for TestEngine {
    fn init(&self, base_path: &Path) -> EngineResult {
        let mut inner = self.enter(EngineOp::Init(base_path.to_path_buf()), false)?;
        inner.initialized = true;
        Ok(())
    }

    fn start(&self) -> EngineResult {
        let mut inner = self.enter(EngineOp::Start, true)?;
        inner.running = true;
        Ok(())
    }

    fn add_source(&self, id: &TrackId, buffer: &SampleBuffer) -> EngineResult {
        let op = EngineOp::AddSource {
            id: id.clone(),
            frames: buffer.frames(),
        };
        let mut inner = self.enter(op, true)?;
        if inner.sources.contains_key(id) {
            return Err(EngineError::Rejected {
                call: "add_source",
                reason: format!("source {} already registered", id),
            });
        }
        inner.sources.insert(id.clone(), buffer.clone());
        Ok(())
    }

    fn remove_source(&self, id: &TrackId) -> EngineResult {
        let mut inner = self.enter(EngineOp::RemoveSource(id.clone()), true)?;
        if inner.sources.remove(id).is_none() {
            return Err(EngineError::Rejected {
                call: "remove_source",
                reason: format!("source {} not registered", id),
            });
        }
        Ok(())
    }

    fn set_mix_track(&self, id: &MixTrackId, patch: &Patch) -> EngineResult {
        let op = EngineOp::SetMixTrack {
            id: id.clone(),
            patch: patch.clone(),
        };
        let mut inner = self.enter(op, true)?;
        let slot = inner.channels.entry(id.clone()).or_insert(Value::Null);
        patch.apply_to(slot);
        Ok(())
    }

    fn remove_mix_track(&self, id: &MixTrackId) -> EngineResult {
        let mut inner = self.enter(EngineOp::RemoveMixTrack(id.clone()), true)?;
        if inner.channels.remove(id).is_none() {
            return Err(EngineError::Rejected {
                call: "remove_mix_track",
                reason: format!("channel {} not registered", id),
            });
        }
        Ok(())
    }

    fn update_playback(&self, patch: &Patch) -> EngineResult {
        let mut inner = self.enter(EngineOp::UpdatePlayback(patch.clone()), true)?;
        patch.apply_to(&mut inner.playback);
        Ok(())
    }

    fn get_timing(&self) -> EngineResult<TimingState> {
        let inner = self.enter(EngineOp::GetTiming, true)?;
        Ok(inner.timing.clone())
    }
}
