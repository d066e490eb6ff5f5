//! Typed engine commands.
//!
//! The reconciler plans a tick as an ordered `Vec<EngineCommand>`, checks it
//! against the [`LiveRegistry`](crate::LiveRegistry), then sends each command.
//! `AddChannel` and `UpdateChannel` both lower to `set_mix_track`; they are
//! distinct so ordering rules (add before update) can be checked.

use std::fmt;

use repsys_types::{MixTrackId, SampleBuffer, SourceId, TrackId};

use crate::{EngineAdapter, EngineResult, Patch};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    UpdatePlayback(Patch),
    /// Register `track`'s source. `source` names the buffer it was loaded from.
    AddSource {
        track: TrackId,
        source: SourceId,
        buffer: SampleBuffer,
    },
    RemoveSource(TrackId),
    /// First `set_mix_track` for a channel, carrying its full parameter set.
    AddChannel { id: MixTrackId, params: Patch },
    UpdateChannel { id: MixTrackId, patch: Patch },
    RemoveChannel(MixTrackId),
}

impl EngineCommand {
    /// Send the command through an adapter.
    pub fn send(&self, engine: &dyn EngineAdapter) -> EngineResult {
        match self {
            EngineCommand::UpdatePlayback(patch) => engine.update_playback(patch),
            EngineCommand::AddSource { track, buffer, .. } => engine.add_source(track, buffer),
            EngineCommand::RemoveSource(track) => engine.remove_source(track),
            EngineCommand::AddChannel { id, params } => engine.set_mix_track(id, params),
            EngineCommand::UpdateChannel { id, patch } => engine.set_mix_track(id, patch),
            EngineCommand::RemoveChannel(id) => engine.remove_mix_track(id),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EngineCommand::UpdatePlayback(_) => "update_playback",
            EngineCommand::AddSource { .. } => "add_source",
            EngineCommand::RemoveSource(_) => "remove_source",
            EngineCommand::AddChannel { .. } => "add_channel",
            EngineCommand::UpdateChannel { .. } => "update_channel",
            EngineCommand::RemoveChannel(_) => "remove_channel",
        }
    }

    /// The engine-side id this command addresses, if any.
    pub fn target(&self) -> Option<String> {
        match self {
            EngineCommand::UpdatePlayback(_) => None,
            EngineCommand::AddSource { track, .. } | EngineCommand::RemoveSource(track) => {
                Some(track.to_string())
            }
            EngineCommand::AddChannel { id, .. }
            | EngineCommand::UpdateChannel { id, .. }
            | EngineCommand::RemoveChannel(id) => Some(id.to_string()),
        }
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::UpdatePlayback(patch) => write!(f, "update_playback({})", patch),
            EngineCommand::AddSource {
                track,
                source,
                buffer,
            } => write!(f, "add_source({}, {} {:?})", track, source, buffer),
            EngineCommand::RemoveSource(track) => write!(f, "remove_source({})", track),
            EngineCommand::AddChannel { id, params } => {
                write!(f, "set_mix_track({}, {}) [add]", id, params)
            }
            EngineCommand::UpdateChannel { id, patch } => {
                write!(f, "set_mix_track({}, {})", id, patch)
            }
            EngineCommand::RemoveChannel(id) => write!(f, "remove_mix_track({})", id),
        }
    }
}
