use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ChannelId;

/// A playback region: `length` samples starting at sample `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub start: u64,
    pub length: u64,
}

impl Chunk {
    pub fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }

    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.length)
    }
}

/// Per-channel routing parameters: how loud one source plays inside its track,
/// and how far it is shifted against the track's transport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelParams {
    pub volume: f32,
    /// Offset in samples relative to the track transport.
    pub offset: i64,
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            volume: 1.0,
            offset: 0,
        }
    }
}

/// Transport state of a track. Every field except `channel_params` is shared
/// by all of the track's mix channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPlayback {
    pub chunks: Vec<Chunk>,
    pub aperiodic: bool,
    /// Speed multiplier applied on top of the global period.
    pub alpha: f32,
    pub volume: f32,
    pub muted: bool,
    pub playing: bool,
    /// Index into `chunks` the transport is currently on. `None` before the
    /// engine has reported a position.
    pub chunk_index: Option<u32>,
    /// Defer parameter changes until the current chunk finishes.
    pub next_at_chunk: bool,
    pub filter: f32,
    pub delay: f32,
    pub delay_gain: f32,
    pub preserve_pitch: bool,
    pub channel_params: BTreeMap<ChannelId, ChannelParams>,
}

impl Default for TrackPlayback {
    fn default() -> Self {
        Self {
            chunks: Vec::new(),
            aperiodic: false,
            alpha: 1.0,
            volume: 1.0,
            muted: false,
            playing: false,
            chunk_index: None,
            next_at_chunk: false,
            filter: 0.5,
            delay: 0.0,
            delay_gain: 0.0,
            preserve_pitch: false,
            channel_params: BTreeMap::new(),
        }
    }
}

/// Engine-wide playback parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalPlayback {
    /// Tempo period: samples per bar.
    pub period: f64,
    pub volume: f32,
    /// Transport running flag.
    pub playing: bool,
}

impl Default for GlobalPlayback {
    fn default() -> Self {
        Self {
            period: 88_200.0,
            volume: 1.0,
            playing: false,
        }
    }
}
