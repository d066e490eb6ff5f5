//! Recoverable anomalies found while reconciling. They are logged and
//! reported, never raised as errors.

use std::fmt;

use repsys_engine::StaleTarget;
use repsys_types::{ChannelId, SourceId, TrackId};

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// The current scene lists a track the snapshot does not hold.
    MissingTrack(TrackId),
    /// A track's primary source is not in the snapshot.
    MissingSource { track: TrackId, source: SourceId },
    /// A declared channel has no entry in its track's parameter map.
    MissingChannelParams { track: TrackId, channel: ChannelId },
    /// An id was listed twice for one entity class.
    DuplicateId(String),
    /// An id was both created and removed in one tick; it was treated as removed.
    LifecycleConflict(String),
    /// A command addressed an id in the wrong lifecycle state and was dropped.
    StaleCommandTarget(StaleTarget),
}

impl Diagnostic {
    /// True for the malformed-snapshot family (entity skipped for the tick).
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Diagnostic::MissingTrack(_)
                | Diagnostic::MissingSource { .. }
                | Diagnostic::MissingChannelParams { .. }
                | Diagnostic::DuplicateId(_)
                | Diagnostic::LifecycleConflict(_)
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingTrack(id) => write!(f, "malformed snapshot: scene lists unknown track {}", id),
            Diagnostic::MissingSource { track, source } => {
                write!(f, "malformed snapshot: track {} uses unknown source {}", track, source)
            }
            Diagnostic::MissingChannelParams { track, channel } => write!(
                f,
                "malformed snapshot: channel {} of track {} has no parameters",
                channel, track
            ),
            Diagnostic::DuplicateId(id) => write!(f, "malformed snapshot: duplicate id {}", id),
            Diagnostic::LifecycleConflict(id) => {
                write!(f, "lifecycle conflict: {} created and removed in one tick", id)
            }
            Diagnostic::StaleCommandTarget(stale) => write!(f, "stale command dropped: {}", stale),
        }
    }
}
