use serde::{Deserialize, Serialize};

use super::playback::{ChannelParams, Chunk, TrackPlayback};
use crate::{ChannelId, SourceId, TrackId};

/// A stored set of chunks that can be loaded into a track's transport.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cue {
    pub chunks: Vec<Chunk>,
}

/// A playable unit: one primary source, a transport, and the mix channels
/// that route sources into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    /// Primary source registered with the engine when the track is created.
    pub source: SourceId,
    /// Mix channels declared on this track. Must be a subset of
    /// `playback.channel_params` keys.
    pub channels: Vec<ChannelId>,
    pub solo: bool,
    pub cues: Vec<Cue>,
    pub playback: TrackPlayback,
}

impl Track {
    pub fn new(id: TrackId, source: SourceId) -> Self {
        Self {
            name: id.to_string(),
            id,
            source,
            channels: Vec::new(),
            solo: false,
            cues: Vec::new(),
            playback: TrackPlayback::default(),
        }
    }

    /// Builder-style: declare a channel with its parameters.
    pub fn with_channel(mut self, id: ChannelId, params: ChannelParams) -> Self {
        self.set_channel(id, params);
        self
    }

    /// Insert or replace a channel, keeping `channels` and `channel_params` in step.
    pub fn set_channel(&mut self, id: ChannelId, params: ChannelParams) {
        if !self.channels.contains(&id) {
            self.channels.push(id.clone());
        }
        self.playback.channel_params.insert(id, params);
    }

    /// Remove a channel. Returns true if it was declared.
    pub fn remove_channel(&mut self, id: &ChannelId) -> bool {
        let before = self.channels.len();
        self.channels.retain(|c| c != id);
        self.playback.channel_params.remove(id);
        self.channels.len() != before
    }

    pub fn channel_params(&self, id: &ChannelId) -> Option<&ChannelParams> {
        self.playback.channel_params.get(id)
    }

    pub fn owns_channel(&self, id: &ChannelId) -> bool {
        self.channels.contains(id)
    }
}
