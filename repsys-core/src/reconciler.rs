//! The reconciler: keeps the engine's object graph in step with the latest
//! committed snapshot and folds engine telemetry back into state.
//!
//! It owns exactly one baseline snapshot (absent until the first commit,
//! replaced wholesale at the end of each tick) and the registry of engine ids
//! it has brought to life. Engine call failures are fatal: the reconciler
//! halts, keeps the error, and refuses further ticks.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use repsys_engine::{EngineAdapter, EngineCommand, EngineError, LiveRegistry};
use repsys_types::reduce::reduce_action;
use repsys_types::{Action, Snapshot, TimingState};

use crate::diagnostic::Diagnostic;
use crate::plan::plan_tick;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    #[error("engine unreachable: {0}")]
    EngineUnreachable(#[from] EngineError),

    #[error("reconciler halted after an earlier engine failure")]
    Halted,
}

pub type ReconcileResult<T = ()> = Result<T, ReconcileError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    /// No baseline yet.
    Idle,
    /// Baseline present, steady state.
    Synced,
    /// An engine call failed. Terminal.
    Halted,
}

/// What one tick did.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Commands sent, in order.
    pub sent: Vec<EngineCommand>,
    pub diagnostics: Vec<Diagnostic>,
}

impl TickReport {
    pub fn is_noop(&self) -> bool {
        self.sent.is_empty()
    }
}

pub struct Reconciler {
    engine: Arc<dyn EngineAdapter>,
    baseline: Option<Arc<Snapshot>>,
    live: LiveRegistry,
    state: ReconcilerState,
    fault: Option<EngineError>,
    last_report: Option<TickReport>,
    /// Mirrors the baseline's global `playing` flag for the telemetry poller.
    transport_running: Arc<AtomicBool>,
}

impl Reconciler {
    /// Initialize the engine at `base_path`. Processing is not started.
    pub fn new(engine: Arc<dyn EngineAdapter>, base_path: &Path) -> ReconcileResult<Self> {
        engine.init(base_path)?;
        log::info!(target: "reconcile", "engine initialized at {}", base_path.display());
        Ok(Self {
            engine,
            baseline: None,
            live: LiveRegistry::new(),
            state: ReconcilerState::Idle,
            fault: None,
            last_report: None,
            transport_running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn start(&mut self) -> ReconcileResult {
        self.ensure_running()?;
        let result = self.engine.start();
        self.check(result)
    }

    pub fn state(&self) -> ReconcilerState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == ReconcilerState::Halted
    }

    /// The error that halted the reconciler.
    pub fn fault(&self) -> Option<&EngineError> {
        self.fault.as_ref()
    }

    /// Report of the most recent completed tick.
    pub fn last_report(&self) -> Option<&TickReport> {
        self.last_report.as_ref()
    }

    pub fn baseline(&self) -> Option<&Arc<Snapshot>> {
        self.baseline.as_ref()
    }

    pub fn live(&self) -> &LiveRegistry {
        &self.live
    }

    pub fn engine(&self) -> &Arc<dyn EngineAdapter> {
        &self.engine
    }

    /// Shared flag, true while the committed global transport is playing.
    pub fn transport_running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.transport_running)
    }

    /// Run one tick against a newly committed snapshot.
    pub fn on_commit(&mut self, snapshot: &Arc<Snapshot>) -> ReconcileResult<TickReport> {
        self.ensure_running()?;

        let plan = plan_tick(self.baseline.as_deref(), snapshot, &self.live);
        let mut report = TickReport {
            sent: Vec::with_capacity(plan.commands.len()),
            diagnostics: plan.diagnostics,
        };

        for cmd in plan.commands {
            if let Err(stale) = self.live.check(&cmd) {
                report.diagnostics.push(Diagnostic::StaleCommandTarget(stale));
                continue;
            }
            let result = cmd.send(self.engine.as_ref());
            self.check(result)?;
            log::debug!(target: "reconcile", "{}", cmd);
            if let EngineCommand::RemoveChannel(id) = &cmd {
                if let Some(age) = self.live.age_of_channel(id) {
                    log::debug!(target: "reconcile", "channel {} removed after {:?}", id, age);
                }
            }
            self.live.record(&cmd);
            report.sent.push(cmd);
        }

        for diagnostic in &report.diagnostics {
            log::warn!(target: "reconcile", "{}", diagnostic);
        }

        self.transport_running
            .store(snapshot.playback.playing, Ordering::Relaxed);
        self.baseline = Some(Arc::clone(snapshot));
        self.state = ReconcilerState::Synced;
        self.last_report = Some(report.clone());
        Ok(report)
    }

    /// Fold engine telemetry into the shadow baseline and return the action to
    /// dispatch. The baseline is updated first, so the commit that the
    /// dispatch triggers diffs against values that already include this
    /// timing and issues no commands.
    ///
    /// The action is committed (chunk positions written into tracks) when the
    /// engine reports a chunk index that differs from the baseline's.
    /// Returns `None` before the first commit or after a halt.
    pub fn absorb_timing(&mut self, timing: TimingState) -> Option<Action> {
        if self.is_halted() {
            return None;
        }
        let baseline = self.baseline.as_ref()?;
        let commit = crosses_chunk(baseline, &timing);
        let action = Action::UpdateTimes { timing, commit };
        self.baseline = Some(Arc::new(reduce_action(baseline, &action)));
        Some(action)
    }

    /// Read telemetry from the engine synchronously and absorb it.
    pub fn poll_telemetry(&mut self) -> ReconcileResult<Option<Action>> {
        self.ensure_running()?;
        if self.baseline.is_none() {
            return Ok(None);
        }
        let timing = self.engine.get_timing();
        let timing = self.check(timing)?;
        Ok(self.absorb_timing(timing))
    }

    /// Halt because of an engine failure observed outside a tick (e.g. by the
    /// telemetry worker).
    pub fn halt(&mut self, err: EngineError) -> ReconcileError {
        log::error!(target: "reconcile", "halting: {}", err);
        self.state = ReconcilerState::Halted;
        self.live.invalidate_all();
        self.transport_running.store(false, Ordering::Relaxed);
        self.fault = Some(err.clone());
        ReconcileError::EngineUnreachable(err)
    }

    fn ensure_running(&self) -> ReconcileResult {
        if self.is_halted() {
            Err(ReconcileError::Halted)
        } else {
            Ok(())
        }
    }

    fn check<T>(&mut self, result: Result<T, EngineError>) -> ReconcileResult<T> {
        result.map_err(|err| self.halt(err))
    }
}

/// True if telemetry moves any channel's owning track to a new chunk.
fn crosses_chunk(baseline: &Snapshot, timing: &TimingState) -> bool {
    timing.channels.iter().any(|(channel, t)| {
        t.chunk_index.is_some()
            && baseline
                .owner_of(channel)
                .is_some_and(|track| track.playback.chunk_index != t.chunk_index)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use repsys_engine::{EngineOp, TestEngine};
    use repsys_types::{
        ChannelId, ChannelParams, ChannelTiming, MixTrackId, SampleBuffer, Source, SourceId, Track,
        TrackId,
    };

    fn snapshot_with_track(id: &str) -> Arc<Snapshot> {
        let state = reduce_action(
            &Snapshot::new(),
            &Action::AddSource(Source::new(SourceId::new(id), SampleBuffer::default())),
        );
        let track = Track::new(TrackId::new(id), SourceId::new(id))
            .with_channel(ChannelId::new(id), ChannelParams::default());
        Arc::new(reduce_action(
            &state,
            &Action::AddTrack {
                track,
                scene_index: None,
            },
        ))
    }

    fn reconciler() -> (Arc<TestEngine>, Reconciler) {
        let engine = Arc::new(TestEngine::new());
        let rec = Reconciler::new(engine.clone(), Path::new("./")).unwrap();
        (engine, rec)
    }

    #[test]
    fn idle_until_first_commit() {
        let (engine, mut rec) = reconciler();
        assert_eq!(rec.state(), ReconcilerState::Idle);
        assert!(rec.absorb_timing(TimingState::default()).is_none());

        let report = rec.on_commit(&snapshot_with_track("A")).unwrap();
        assert_eq!(rec.state(), ReconcilerState::Synced);
        assert_eq!(report.sent.len(), 3);
        assert_eq!(rec.last_report().map(|r| r.sent.len()), Some(3));
        assert_eq!(engine.live_channels(), vec![MixTrackId::new("A", "A")]);
    }

    #[test]
    fn engine_failure_halts() {
        let (engine, mut rec) = reconciler();
        engine.set_unreachable(true);
        let err = rec.on_commit(&snapshot_with_track("A")).unwrap_err();
        assert!(matches!(err, ReconcileError::EngineUnreachable(EngineError::Unreachable(_))));
        assert!(rec.is_halted());
        assert!(rec.baseline().is_none());
        assert!(rec.fault().is_some());

        engine.set_unreachable(false);
        assert_eq!(
            rec.on_commit(&snapshot_with_track("A")).unwrap_err(),
            ReconcileError::Halted
        );
        assert!(rec.poll_telemetry().is_err());
    }

    #[test]
    fn transport_flag_follows_commits() {
        let (_engine, mut rec) = reconciler();
        let flag = rec.transport_running();
        let mut state = (*snapshot_with_track("A")).clone();
        rec.on_commit(&Arc::new(state.clone())).unwrap();
        assert!(!flag.load(Ordering::Relaxed));
        Arc::make_mut(&mut state.playback).playing = true;
        rec.on_commit(&Arc::new(state)).unwrap();
        assert!(flag.load(Ordering::Relaxed));
    }

    #[test]
    fn absorb_updates_shadow_baseline_first() {
        let (_engine, mut rec) = reconciler();
        rec.on_commit(&snapshot_with_track("A")).unwrap();

        let mut timing = TimingState {
            time: 4410.0,
            ..Default::default()
        };
        timing.channels.insert(
            MixTrackId::new("A", "A"),
            ChannelTiming {
                sample: 4410.0,
                playing: true,
                chunk_index: Some(2),
            },
        );
        let action = rec.absorb_timing(timing.clone()).unwrap();
        assert_eq!(
            action,
            Action::UpdateTimes {
                timing: timing.clone(),
                commit: true,
            }
        );
        let baseline = rec.baseline().unwrap();
        assert_eq!(baseline.timing, timing);
        assert_eq!(baseline.tracks[&TrackId::new("A")].playback.chunk_index, Some(2));

        // Same position again: display only.
        match rec.absorb_timing(timing).unwrap() {
            Action::UpdateTimes { commit, .. } => assert!(!commit),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn tracks_sharing_a_source_register_separately() {
        let (engine, mut rec) = reconciler();
        let first = snapshot_with_track("A");
        rec.on_commit(&first).unwrap();
        engine.clear();

        let track = Track::new(TrackId::new("B"), SourceId::new("A"))
            .with_channel(ChannelId::new("B"), ChannelParams::default());
        let next = Arc::new(reduce_action(
            &first,
            &Action::AddTrack {
                track,
                scene_index: None,
            },
        ));
        let report = rec.on_commit(&next).unwrap();
        assert!(report.diagnostics.is_empty());
        assert_eq!(
            engine.mutations(),
            vec![
                EngineOp::AddSource {
                    id: TrackId::new("B"),
                    frames: 0
                },
                EngineOp::SetMixTrack {
                    id: MixTrackId::new("B", "B"),
                    patch: match &report.sent[1] {
                        EngineCommand::AddChannel { params, .. } => params.clone(),
                        other => panic!("unexpected {:?}", other),
                    },
                },
            ]
        );
        assert!(rec.live().is_track_live(&TrackId::new("B")));

        // A second identical commit is quiet.
        engine.clear();
        assert!(rec.on_commit(&next).unwrap().is_noop());
        assert!(rec.last_report().unwrap().diagnostics.is_empty());
    }

    #[test]
    fn last_report_survives_a_halt() {
        let (engine, mut rec) = reconciler();
        rec.on_commit(&snapshot_with_track("A")).unwrap();
        engine.set_unreachable(true);
        let mut next = (*snapshot_with_track("A")).clone();
        Arc::make_mut(&mut next.playback).playing = true;
        assert!(rec.on_commit(&Arc::new(next)).is_err());
        assert_eq!(rec.last_report().map(|r| r.sent.len()), Some(3));
    }
}
