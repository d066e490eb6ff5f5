use std::sync::Arc;

use super::with_track;
use crate::{Action, Scene, Snapshot};

pub(super) fn reduce(action: &Action, state: &mut Snapshot) {
    match action {
        Action::AddTrack { track, scene_index } => {
            for scene in &mut state.scenes {
                scene.tracks.retain(|id| id != &track.id);
            }
            let idx = scene_index.unwrap_or(state.scene_index);
            if state.scenes.len() <= idx {
                state.scenes.resize_with(idx + 1, Scene::default);
            }
            state.scenes[idx].tracks.push(track.id.clone());
            state.tracks.insert(track.id.clone(), Arc::new(track.clone()));
        }
        Action::RemoveTrack(id) => {
            state.tracks.remove(id);
            for scene in &mut state.scenes {
                scene.tracks.retain(|t| t != id);
            }
        }
        Action::SetTrackPlayback { track_id, update } => {
            with_track(state, track_id, |t| update.apply(&mut t.playback));
        }
        Action::SetChannelParams {
            track_id,
            channel_id,
            params,
        } => {
            with_track(state, track_id, |t| t.set_channel(channel_id.clone(), *params));
        }
        Action::RemoveChannel {
            track_id,
            channel_id,
        } => {
            with_track(state, track_id, |t| {
                t.remove_channel(channel_id);
            });
        }
        Action::SetTrackMuted { track_id, muted } => {
            with_track(state, track_id, |t| t.playback.muted = *muted);
        }
        Action::SetTrackSolo { track_id, solo } => {
            with_track(state, track_id, |t| t.solo = *solo);
        }
        Action::ToggleTrack(track_id) => {
            with_track(state, track_id, |t| t.playback.playing = !t.playback.playing);
        }
        Action::AddCue {
            track_id,
            cue,
            index,
        } => {
            with_track(state, track_id, |t| {
                let at = index.unwrap_or(t.cues.len()).min(t.cues.len());
                t.cues.insert(at, cue.clone());
            });
        }
        Action::DeleteCue { track_id, index } => {
            with_track(state, track_id, |t| {
                if *index < t.cues.len() {
                    t.cues.remove(*index);
                }
            });
        }
        Action::SelectCue { track_id, index } => {
            let has_cue = state
                .tracks
                .get(track_id)
                .is_some_and(|t| *index < t.cues.len());
            if has_cue {
                with_track(state, track_id, |t| {
                    t.playback.chunks = t.cues[*index].chunks.clone();
                    t.playback.chunk_index = Some(0);
                    t.playback.playing = true;
                });
            }
        }
        _ => {}
    }
}
