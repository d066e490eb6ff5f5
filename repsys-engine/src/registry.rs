use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::time::{Duration, Instant};

use repsys_types::{MixTrackId, SourceId, TrackId};

use crate::EngineCommand;

/// Why a command was refused by [`LiveRegistry::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// Update or remove of an id the engine does not hold.
    NotLive,
    /// Add of an id the engine already holds.
    AlreadyLive,
}

/// A command whose target does not match the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleTarget {
    pub command: &'static str,
    pub id: String,
    pub reason: StaleReason,
}

impl fmt::Display for StaleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.reason {
            StaleReason::NotLive => "is not live",
            StaleReason::AlreadyLive => "is already live",
        };
        write!(f, "{} target {} {}", self.command, self.id, reason)
    }
}

/// Registry of the engine-side ids the reconciler believes to be alive:
/// one source per track (remembering which buffer it was loaded from) and
/// the track-scoped mix channels.
///
/// Updated only after a command was sent successfully. When the engine is
/// lost, `invalidate_all()` clears it so later checks surface stale targets
/// instead of addressing dead objects.
#[derive(Debug, Default)]
pub struct LiveRegistry {
    sources: BTreeMap<TrackId, SourceId>,
    channels: BTreeSet<MixTrackId>,
    created_at: HashMap<MixTrackId, Instant>,
}

impl LiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse commands that would address an absent id or re-add a live one.
    pub fn check(&self, cmd: &EngineCommand) -> Result<(), StaleTarget> {
        let stale = |reason| StaleTarget {
            command: cmd.name(),
            id: cmd.target().unwrap_or_default(),
            reason,
        };
        match cmd {
            EngineCommand::UpdatePlayback(_) => Ok(()),
            EngineCommand::AddSource { track, .. } if self.is_track_live(track) => {
                Err(stale(StaleReason::AlreadyLive))
            }
            EngineCommand::AddChannel { id, .. } if self.is_channel_live(id) => {
                Err(stale(StaleReason::AlreadyLive))
            }
            EngineCommand::RemoveSource(track) if !self.is_track_live(track) => {
                Err(stale(StaleReason::NotLive))
            }
            EngineCommand::UpdateChannel { id, .. } | EngineCommand::RemoveChannel(id)
                if !self.is_channel_live(id) =>
            {
                Err(stale(StaleReason::NotLive))
            }
            _ => Ok(()),
        }
    }

    /// Record the effect of a command that was sent.
    pub fn record(&mut self, cmd: &EngineCommand) {
        match cmd {
            EngineCommand::UpdatePlayback(_) | EngineCommand::UpdateChannel { .. } => {}
            EngineCommand::AddSource { track, source, .. } => {
                self.sources.insert(track.clone(), source.clone());
            }
            EngineCommand::RemoveSource(track) => {
                self.sources.remove(track);
            }
            EngineCommand::AddChannel { id, .. } => {
                self.channels.insert(id.clone());
                self.created_at.insert(id.clone(), Instant::now());
            }
            EngineCommand::RemoveChannel(id) => {
                self.channels.remove(id);
                self.created_at.remove(id);
            }
        }
    }

    /// A track is live once its own source has been registered.
    pub fn is_track_live(&self, track: &TrackId) -> bool {
        self.sources.contains_key(track)
    }

    pub fn is_channel_live(&self, id: &MixTrackId) -> bool {
        self.channels.contains(id)
    }

    /// Buffer the track's engine source was loaded from.
    pub fn source_of(&self, track: &TrackId) -> Option<&SourceId> {
        self.sources.get(track)
    }

    /// Live channels owned by `track`, sorted by channel id.
    pub fn channels_of(&self, track: &TrackId) -> Vec<MixTrackId> {
        self.channels
            .iter()
            .filter(|id| &id.track == track)
            .cloned()
            .collect()
    }

    /// How long a channel has been alive.
    pub fn age_of_channel(&self, id: &MixTrackId) -> Option<Duration> {
        self.created_at.get(id).map(Instant::elapsed)
    }

    /// Mark everything dead (engine lost).
    pub fn invalidate_all(&mut self) {
        self.sources.clear();
        self.channels.clear();
        self.created_at.clear();
    }

    pub fn live_source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn live_channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Patch;
    use repsys_types::SampleBuffer;

    fn add_source(track: &str, source: &str) -> EngineCommand {
        EngineCommand::AddSource {
            track: TrackId::new(track),
            source: SourceId::new(source),
            buffer: SampleBuffer::default(),
        }
    }

    fn add_channel(track: &str, channel: &str) -> EngineCommand {
        EngineCommand::AddChannel {
            id: MixTrackId::new(track, channel),
            params: Patch::new(),
        }
    }

    #[test]
    fn register_and_unregister() {
        let mut reg = LiveRegistry::new();
        let a = TrackId::new("A");
        reg.record(&add_source("A", "loop"));
        reg.record(&add_channel("A", "A1"));
        assert!(reg.is_track_live(&a));
        assert_eq!(reg.source_of(&a), Some(&SourceId::new("loop")));
        assert!(reg.is_channel_live(&MixTrackId::new("A", "A1")));
        assert_eq!(reg.channels_of(&a), vec![MixTrackId::new("A", "A1")]);
        assert!(reg.age_of_channel(&MixTrackId::new("A", "A1")).is_some());

        reg.record(&EngineCommand::RemoveChannel(MixTrackId::new("A", "A1")));
        reg.record(&EngineCommand::RemoveSource(a.clone()));
        assert_eq!(reg.live_channel_count(), 0);
        assert_eq!(reg.live_source_count(), 0);
        assert!(!reg.is_track_live(&a));
    }

    #[test]
    fn tracks_sharing_names_stay_apart() {
        let mut reg = LiveRegistry::new();
        reg.record(&add_source("A", "loop"));
        reg.record(&add_channel("A", "main"));
        assert!(reg.check(&add_source("B", "loop")).is_ok());
        assert!(reg.check(&add_channel("B", "main")).is_ok());
        reg.record(&add_source("B", "loop"));
        reg.record(&add_channel("B", "main"));

        assert!(reg.is_track_live(&TrackId::new("B")));
        assert_eq!(reg.channels_of(&TrackId::new("B")), vec![MixTrackId::new("B", "main")]);

        reg.record(&EngineCommand::RemoveChannel(MixTrackId::new("A", "main")));
        reg.record(&EngineCommand::RemoveSource(TrackId::new("A")));
        assert!(reg.is_channel_live(&MixTrackId::new("B", "main")));
        assert!(reg.is_track_live(&TrackId::new("B")));
    }

    #[test]
    fn check_refuses_update_of_unknown_channel() {
        let reg = LiveRegistry::new();
        let err = reg
            .check(&EngineCommand::UpdateChannel {
                id: MixTrackId::new("A", "ghost"),
                patch: Patch::new(),
            })
            .unwrap_err();
        assert_eq!(err.reason, StaleReason::NotLive);
        assert_eq!(err.id, "A/ghost");
    }

    #[test]
    fn check_refuses_double_add() {
        let mut reg = LiveRegistry::new();
        reg.record(&add_source("A", "A"));
        assert_eq!(
            reg.check(&add_source("A", "other")).unwrap_err().reason,
            StaleReason::AlreadyLive
        );
        assert!(reg.check(&add_source("B", "A")).is_ok());
    }

    #[test]
    fn invalidate_all_clears_everything() {
        let mut reg = LiveRegistry::new();
        reg.record(&add_source("A", "A"));
        reg.record(&add_channel("A", "A1"));
        reg.invalidate_all();
        assert_eq!(reg.live_source_count(), 0);
        assert!(reg
            .check(&EngineCommand::RemoveChannel(MixTrackId::new("A", "A1")))
            .is_err());
    }
}
