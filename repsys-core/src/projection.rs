//! Projection of snapshot entities onto the records the engine understands.
//!
//! Field names are the engine's (camelCase). A mix channel's parameter
//! object is its track's transport record plus a nested `source` record with
//! the channel's own routing.

use serde::Serialize;

use repsys_engine::Patch;
use repsys_types::{ChannelId, GlobalPlayback, Track, TrackId};

use crate::diff::diff_records;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalRecord {
    pub period: f64,
    pub volume: f32,
    pub playing: bool,
}

/// Shared transport state, broadcast to every channel of a track.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportRecord {
    /// Flattened `start, length` pairs.
    pub chunks: Vec<u64>,
    pub aperiodic: bool,
    pub alpha: f32,
    pub volume: f32,
    /// Effective mute, solo applied.
    pub muted: bool,
    pub playing: bool,
    /// `-1` until a position is known.
    pub chunk_index: i64,
    pub next_at_chunk: bool,
    pub filter: f32,
    pub delay: f32,
    pub delay_gain: f32,
    pub preserve_pitch: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSource {
    /// Engine source feeding the channel. Sources are registered under the
    /// owning track's id.
    pub id: TrackId,
    pub volume: f32,
    pub offset: i64,
}

/// Per-channel routing of a source into its track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelRecord {
    pub source: ChannelSource,
}

pub fn global_record(playback: &GlobalPlayback) -> GlobalRecord {
    GlobalRecord {
        period: playback.period,
        volume: playback.volume,
        playing: playback.playing,
    }
}

/// A soloed track elsewhere in the scene mutes every track that is not soloed.
pub fn effective_mute(track: &Track, solo_active: bool) -> bool {
    track.playback.muted || (solo_active && !track.solo)
}

pub fn transport_record(track: &Track, solo_active: bool) -> TransportRecord {
    let p = &track.playback;
    TransportRecord {
        chunks: p.chunks.iter().flat_map(|c| [c.start, c.length]).collect(),
        aperiodic: p.aperiodic,
        alpha: p.alpha,
        volume: p.volume,
        muted: effective_mute(track, solo_active),
        playing: p.playing,
        chunk_index: p.chunk_index.map_or(-1, i64::from),
        next_at_chunk: p.next_at_chunk,
        filter: p.filter,
        delay: p.delay,
        delay_gain: p.delay_gain,
        preserve_pitch: p.preserve_pitch,
    }
}

/// `None` when the track declares no parameters for `channel`.
pub fn channel_record(track: &Track, channel: &ChannelId) -> Option<ChannelRecord> {
    let params = track.channel_params(channel)?;
    Some(ChannelRecord {
        source: ChannelSource {
            id: track.id.clone(),
            volume: params.volume,
            offset: params.offset,
        },
    })
}

/// Full parameter set sent when a channel is added.
pub fn initial_channel_params(track: &Track, channel: &ChannelId, solo_active: bool) -> Option<Patch> {
    let channel = channel_record(track, channel)?;
    let mut params = diff_records(None, &transport_record(track, solo_active));
    params.merge(diff_records(None, &channel));
    Some(params)
}
