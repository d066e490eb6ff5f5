use std::collections::BTreeMap;
use std::sync::Arc;

use super::playback::GlobalPlayback;
use super::source::Source;
use super::timing::TimingState;
use super::track::Track;
use crate::{MixTrackId, SourceId, TrackId};

/// An ordered list of tracks. Exactly one scene is current.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub tracks: Vec<TrackId>,
}

/// One immutable application-state tree.
///
/// Snapshots are persistent: reducers clone the `Arc` spine and copy-on-write
/// only what they touch, so an untouched track is pointer-equal between two
/// consecutive snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub scenes: Vec<Scene>,
    pub scene_index: usize,
    pub tracks: BTreeMap<TrackId, Arc<Track>>,
    pub sources: BTreeMap<SourceId, Source>,
    pub playback: Arc<GlobalPlayback>,
    pub timing: TimingState,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            scenes: vec![Scene::default()],
            scene_index: 0,
            tracks: BTreeMap::new(),
            sources: BTreeMap::new(),
            playback: Arc::new(GlobalPlayback::default()),
            timing: TimingState::default(),
        }
    }
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.scenes.get(self.scene_index)
    }

    /// Track ids of the current scene, in scene order.
    pub fn current_track_ids(&self) -> &[TrackId] {
        self.current_scene()
            .map(|s| s.tracks.as_slice())
            .unwrap_or(&[])
    }

    pub fn track(&self, id: &TrackId) -> Option<&Arc<Track>> {
        self.tracks.get(id)
    }

    pub fn source(&self, id: &SourceId) -> Option<&Source> {
        self.sources.get(id)
    }

    /// Index of the scene holding `id`, if any.
    pub fn scene_of(&self, id: &TrackId) -> Option<usize> {
        self.scenes.iter().position(|s| s.tracks.contains(id))
    }

    /// Track in the current scene that declares the addressed channel.
    pub fn owner_of(&self, channel: &MixTrackId) -> Option<&Arc<Track>> {
        if !self.current_track_ids().contains(&channel.track) {
            return None;
        }
        self.tracks
            .get(&channel.track)
            .filter(|t| t.owns_channel(&channel.channel))
    }

    /// True if any track of the current scene is soloed.
    pub fn solo_active(&self) -> bool {
        self.current_track_ids()
            .iter()
            .filter_map(|id| self.tracks.get(id))
            .any(|t| t.solo)
    }
}
