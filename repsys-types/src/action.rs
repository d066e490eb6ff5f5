//! Action types for the store.
//!
//! Actions represent user intents (and engine telemetry) that flow through
//! `reduce::reduce_action`. Partial updates use `Option` fields: `None`
//! leaves the current value untouched.

use crate::{ChannelId, ChannelParams, Chunk, Cue, GlobalPlayback, Source, SourceId, TimingState, Track, TrackId, TrackPlayback};

/// Partial update of a track's shared transport state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackPlaybackUpdate {
    pub chunks: Option<Vec<Chunk>>,
    pub aperiodic: Option<bool>,
    pub alpha: Option<f32>,
    pub volume: Option<f32>,
    pub muted: Option<bool>,
    pub playing: Option<bool>,
    pub chunk_index: Option<Option<u32>>,
    pub next_at_chunk: Option<bool>,
    pub filter: Option<f32>,
    pub delay: Option<f32>,
    pub delay_gain: Option<f32>,
    pub preserve_pitch: Option<bool>,
}

impl TrackPlaybackUpdate {
    pub fn playing(playing: bool) -> Self {
        Self {
            playing: Some(playing),
            ..Default::default()
        }
    }

    pub fn apply(&self, playback: &mut TrackPlayback) {
        if let Some(chunks) = &self.chunks {
            playback.chunks = chunks.clone();
        }
        if let Some(v) = self.aperiodic {
            playback.aperiodic = v;
        }
        if let Some(v) = self.alpha {
            playback.alpha = v;
        }
        if let Some(v) = self.volume {
            playback.volume = v;
        }
        if let Some(v) = self.muted {
            playback.muted = v;
        }
        if let Some(v) = self.playing {
            playback.playing = v;
        }
        if let Some(v) = self.chunk_index {
            playback.chunk_index = v;
        }
        if let Some(v) = self.next_at_chunk {
            playback.next_at_chunk = v;
        }
        if let Some(v) = self.filter {
            playback.filter = v;
        }
        if let Some(v) = self.delay {
            playback.delay = v;
        }
        if let Some(v) = self.delay_gain {
            playback.delay_gain = v;
        }
        if let Some(v) = self.preserve_pitch {
            playback.preserve_pitch = v;
        }
    }
}

/// Partial update of the engine-wide playback parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlobalPlaybackUpdate {
    pub period: Option<f64>,
    pub volume: Option<f32>,
    pub playing: Option<bool>,
}

impl GlobalPlaybackUpdate {
    pub fn apply(&self, playback: &mut GlobalPlayback) {
        if let Some(v) = self.period {
            playback.period = v;
        }
        if let Some(v) = self.volume {
            playback.volume = v;
        }
        if let Some(v) = self.playing {
            playback.playing = v;
        }
    }
}

/// Every state edit the store understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // Sources
    AddSource(Source),
    RemoveSource(SourceId),

    // Tracks
    /// Add (or replace) a track. `scene_index: None` targets the current scene.
    AddTrack {
        track: Track,
        scene_index: Option<usize>,
    },
    RemoveTrack(TrackId),
    SetTrackPlayback {
        track_id: TrackId,
        update: TrackPlaybackUpdate,
    },
    /// Set a channel's parameters, declaring the channel if it is new.
    SetChannelParams {
        track_id: TrackId,
        channel_id: ChannelId,
        params: ChannelParams,
    },
    RemoveChannel {
        track_id: TrackId,
        channel_id: ChannelId,
    },
    SetTrackMuted {
        track_id: TrackId,
        muted: bool,
    },
    SetTrackSolo {
        track_id: TrackId,
        solo: bool,
    },
    /// Flip a track's `playing` flag.
    ToggleTrack(TrackId),

    // Cues
    AddCue {
        track_id: TrackId,
        cue: Cue,
        index: Option<usize>,
    },
    DeleteCue {
        track_id: TrackId,
        index: usize,
    },
    /// Load a cue's chunks into the transport and start from its first chunk.
    SelectCue {
        track_id: TrackId,
        index: usize,
    },

    // Global
    UpdatePlayback(GlobalPlaybackUpdate),

    // Scenes
    SetSceneIndex(usize),
    CreateScene(usize),
    DeleteScene(usize),
    MoveTrackToScene {
        track_id: TrackId,
        to_scene: usize,
        index: Option<usize>,
    },

    /// Engine telemetry. `commit: false` is display-only: only `Snapshot::timing`
    /// changes. `commit: true` also writes reported chunk positions into the
    /// owning tracks.
    UpdateTimes {
        timing: TimingState,
        commit: bool,
    },
}

impl Action {
    /// True for actions produced by the telemetry loop.
    pub fn is_telemetry(&self) -> bool {
        matches!(self, Action::UpdateTimes { .. })
    }

    /// Short stable name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddSource(_) => "ADD_SOURCE",
            Action::RemoveSource(_) => "REMOVE_SOURCE",
            Action::AddTrack { .. } => "ADD_TRACK",
            Action::RemoveTrack(_) => "REMOVE_TRACK",
            Action::SetTrackPlayback { .. } => "SET_TRACK_PLAYBACK",
            Action::SetChannelParams { .. } => "SET_CHANNEL_PARAMS",
            Action::RemoveChannel { .. } => "REMOVE_CHANNEL",
            Action::SetTrackMuted { .. } => "SET_TRACK_MUTE",
            Action::SetTrackSolo { .. } => "SET_TRACK_SOLO",
            Action::ToggleTrack(_) => "TOGGLE_TRACK_PLAYBACK",
            Action::AddCue { .. } => "ADD_CUE",
            Action::DeleteCue { .. } => "DELETE_CUE",
            Action::SelectCue { .. } => "SELECT_CUE",
            Action::UpdatePlayback(_) => "UPDATE_PLAYBACK",
            Action::SetSceneIndex(_) => "SET_SCENE_INDEX",
            Action::CreateScene(_) => "CREATE_SCENE",
            Action::DeleteScene(_) => "DELETE_SCENE",
            Action::MoveTrackToScene { .. } => "ADD_TRACK_TO_SCENE",
            Action::UpdateTimes { .. } => "UPDATE_TIMES",
        }
    }
}
