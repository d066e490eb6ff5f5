//! # repsys-types
//!
//! Shared type definitions for the repsys live-looping workspace.
//! This crate holds the immutable application-state tree (`Snapshot`), the
//! `Action` enum that edits it, and the pure reducers that apply actions.
//!
//! Nothing here talks to the engine. `repsys-engine` consumes these types for
//! its command payloads and telemetry, `repsys-core` reconciles them.

pub mod action;
pub mod reduce;
pub mod state;

pub use action::*;
pub use state::*;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Unique identifier for a track. Tracks are keyed by this across scenes.
    TrackId
);

string_id!(
    /// Unique identifier for a source (an identified sample buffer).
    SourceId
);

string_id!(
    /// Identifier of a mix channel, unique only within its owning track.
    ChannelId
);

/// Engine-side address of a mix channel: the owning track plus the channel.
///
/// Two tracks may both declare a channel `main`; the engine sees them as
/// `A/main` and `B/main`. Track ids must not contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct MixTrackId {
    pub track: TrackId,
    pub channel: ChannelId,
}

impl MixTrackId {
    pub fn new(track: impl Into<TrackId>, channel: impl Into<ChannelId>) -> Self {
        Self {
            track: track.into(),
            channel: channel.into(),
        }
    }

    /// Parse the `track/channel` form.
    pub fn parse(s: &str) -> Option<Self> {
        let (track, channel) = s.split_once('/')?;
        if track.is_empty() || channel.is_empty() {
            return None;
        }
        Some(Self::new(track, channel))
    }
}

impl std::fmt::Display for MixTrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.track, self.channel)
    }
}

impl From<MixTrackId> for String {
    fn from(id: MixTrackId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for MixTrackId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s).ok_or_else(|| format!("mix track id {:?} is not track/channel", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_track_id_is_scoped_by_track() {
        let a = MixTrackId::new("A", "main");
        let b = MixTrackId::new("B", "main");
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "A/main");
        assert_eq!(MixTrackId::parse("B/main"), Some(b));
        assert_eq!(MixTrackId::parse("main"), None);
        assert_eq!(MixTrackId::parse("/main"), None);
    }

    #[test]
    fn mix_track_id_serializes_as_string_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(MixTrackId::new("A", "A1"), 1);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"A/A1":1}"#);
        let back: std::collections::BTreeMap<MixTrackId, i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
