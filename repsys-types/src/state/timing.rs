use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::MixTrackId;

/// Playback position of one mix channel as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelTiming {
    /// Current read head in samples.
    pub sample: f64,
    pub playing: bool,
    pub chunk_index: Option<u32>,
}

/// Engine-reported transport time. Display state only: the reconciler never
/// diffs it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimingState {
    /// Transport time in samples.
    pub time: f64,
    /// Keyed by the engine address, so channels of different tracks never collide.
    pub channels: BTreeMap<MixTrackId, ChannelTiming>,
}
