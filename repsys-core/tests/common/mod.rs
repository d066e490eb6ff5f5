#![allow(dead_code)]
//! Test harness utilities for repsys-core integration tests.

use std::path::Path;
use std::sync::Arc;

use repsys_core::Reconciler;
use repsys_engine::{EngineOp, TestEngine};
use repsys_types::reduce::reduce_action;
use repsys_types::{
    Action, ChannelId, ChannelParams, ChannelTiming, MixTrackId, SampleBuffer, Snapshot, Source,
    SourceId, TimingState, Track, TrackId,
};

pub fn tid(id: &str) -> TrackId {
    TrackId::new(id)
}

pub fn cid(id: &str) -> ChannelId {
    ChannelId::new(id)
}

/// Engine address of `channel` on `track`.
pub fn mix(track: &str, channel: &str) -> MixTrackId {
    MixTrackId::new(track, channel)
}

pub fn buffer() -> SampleBuffer {
    SampleBuffer::new(vec![vec![0.0; 64], vec![0.0; 64]])
}

/// A track whose primary source shares its id, with the given channels at
/// default parameters.
pub fn track(id: &str, channels: &[&str]) -> Track {
    track_on(id, id, channels)
}

/// A track playing `source`, with the given channels at default parameters.
pub fn track_on(id: &str, source: &str, channels: &[&str]) -> Track {
    let mut track = Track::new(TrackId::new(id), SourceId::new(source));
    for ch in channels {
        track.set_channel(ChannelId::new(*ch), ChannelParams::default());
    }
    track
}

/// Register the source (unless already present) and add the track to the
/// current scene.
pub fn add_track(state: &Snapshot, track: Track) -> Snapshot {
    let state = if state.source(&track.source).is_some() {
        state.clone()
    } else {
        reduce_action(
            state,
            &Action::AddSource(Source::new(track.source.clone(), buffer())),
        )
    };
    reduce_action(
        &state,
        &Action::AddTrack {
            track,
            scene_index: None,
        },
    )
}

pub fn apply(state: &Snapshot, action: Action) -> Snapshot {
    reduce_action(state, &action)
}

pub fn reconciler() -> (Arc<TestEngine>, Reconciler) {
    let engine = Arc::new(TestEngine::new());
    let reconciler = Reconciler::new(engine.clone(), Path::new("./")).unwrap();
    engine.clear();
    (engine, reconciler)
}

/// A reconciler already synced to `state`, with the engine log cleared.
pub fn synced(state: &Snapshot) -> (Arc<TestEngine>, Reconciler, Arc<Snapshot>) {
    let (engine, mut reconciler) = reconciler();
    let state = Arc::new(state.clone());
    reconciler.on_commit(&state).unwrap();
    engine.clear();
    (engine, reconciler, state)
}

pub fn timing_for(track: &str, channel: &str, sample: f64, chunk_index: Option<u32>) -> TimingState {
    let mut timing = TimingState {
        time: sample,
        ..Default::default()
    };
    timing.channels.insert(
        MixTrackId::new(track, channel),
        ChannelTiming {
            sample,
            playing: true,
            chunk_index,
        },
    );
    timing
}

/// Compact rendering of the mutation log, e.g. `"set_mix_track A"`.
pub fn ops(engine: &TestEngine) -> Vec<String> {
    engine
        .mutations()
        .iter()
        .map(|op| match op {
            EngineOp::AddSource { id, .. } => format!("add_source {}", id),
            EngineOp::RemoveSource(id) => format!("remove_source {}", id),
            EngineOp::SetMixTrack { id, .. } => format!("set_mix_track {}", id),
            EngineOp::RemoveMixTrack(id) => format!("remove_mix_track {}", id),
            EngineOp::UpdatePlayback(_) => "update_playback".to_string(),
            other => format!("{:?}", other),
        })
        .collect()
}
