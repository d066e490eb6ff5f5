//! Pure state reducers.
//!
//! `reduce_action` is the single source of truth for action → state
//! transitions. It never mutates its input: it returns a new `Snapshot` that
//! shares every untouched `Arc` with the previous one.
//!
//! Reducers do NOT talk to the engine, log, or validate cross-entity
//! invariants. Unknown ids and out-of-range indices are no-ops.

mod scene;
mod timing;
mod track;

use std::sync::Arc;

use crate::{Action, Snapshot, Track, TrackId};

/// Apply an action, producing the next snapshot.
pub fn reduce_action(state: &Snapshot, action: &Action) -> Snapshot {
    let mut next = state.clone();
    match action {
        Action::AddSource(source) => {
            next.sources.insert(source.id.clone(), source.clone());
        }
        Action::RemoveSource(id) => {
            next.sources.remove(id);
        }

        Action::AddTrack { .. }
        | Action::RemoveTrack(_)
        | Action::SetTrackPlayback { .. }
        | Action::SetChannelParams { .. }
        | Action::RemoveChannel { .. }
        | Action::SetTrackMuted { .. }
        | Action::SetTrackSolo { .. }
        | Action::ToggleTrack(_)
        | Action::AddCue { .. }
        | Action::DeleteCue { .. }
        | Action::SelectCue { .. } => track::reduce(action, &mut next),

        Action::UpdatePlayback(update) => {
            update.apply(Arc::make_mut(&mut next.playback));
        }

        Action::SetSceneIndex(_)
        | Action::CreateScene(_)
        | Action::DeleteScene(_)
        | Action::MoveTrackToScene { .. } => scene::reduce(action, &mut next),

        Action::UpdateTimes { timing, commit } => timing::reduce(timing, *commit, &mut next),
    }
    next
}

/// Copy-on-write access to one track. Returns false if the track is unknown.
fn with_track(state: &mut Snapshot, id: &TrackId, f: impl FnOnce(&mut Track)) -> bool {
    match state.tracks.get_mut(id) {
        Some(track) => {
            f(Arc::make_mut(track));
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ChannelId, ChannelParams, ChannelTiming, Chunk, Cue, GlobalPlaybackUpdate, MixTrackId,
        SourceId, TimingState, TrackPlaybackUpdate,
    };

    fn track(id: &str) -> Track {
        Track::new(TrackId::new(id), SourceId::new(id))
            .with_channel(ChannelId::new(id), ChannelParams::default())
    }

    fn with_tracks(ids: &[&str]) -> Snapshot {
        let mut state = Snapshot::new();
        for id in ids {
            state = reduce_action(
                &state,
                &Action::AddTrack {
                    track: track(id),
                    scene_index: None,
                },
            );
        }
        state
    }

    #[test]
    fn add_track_appends_to_current_scene() {
        let state = with_tracks(&["A", "B"]);
        assert_eq!(
            state.current_track_ids(),
            &[TrackId::new("A"), TrackId::new("B")]
        );
        assert_eq!(state.tracks.len(), 2);
    }

    #[test]
    fn untouched_tracks_stay_pointer_equal() {
        let before = with_tracks(&["A", "B"]);
        let after = reduce_action(
            &before,
            &Action::SetTrackPlayback {
                track_id: TrackId::new("A"),
                update: TrackPlaybackUpdate::playing(true),
            },
        );
        let a = TrackId::new("A");
        let b = TrackId::new("B");
        assert!(!Arc::ptr_eq(&before.tracks[&a], &after.tracks[&a]));
        assert!(Arc::ptr_eq(&before.tracks[&b], &after.tracks[&b]));
        assert!(Arc::ptr_eq(&before.playback, &after.playback));
        assert!(!before.tracks[&a].playback.playing);
        assert!(after.tracks[&a].playback.playing);
    }

    #[test]
    fn update_playback_is_partial() {
        let state = Snapshot::new();
        let next = reduce_action(
            &state,
            &Action::UpdatePlayback(GlobalPlaybackUpdate {
                playing: Some(true),
                ..Default::default()
            }),
        );
        assert!(next.playback.playing);
        assert_eq!(next.playback.period, state.playback.period);
    }

    #[test]
    fn remove_track_clears_scene_membership() {
        let state = with_tracks(&["A", "B"]);
        let next = reduce_action(&state, &Action::RemoveTrack(TrackId::new("A")));
        assert_eq!(next.current_track_ids(), &[TrackId::new("B")]);
        assert!(next.track(&TrackId::new("A")).is_none());
    }

    #[test]
    fn set_channel_params_declares_new_channel() {
        let state = with_tracks(&["A"]);
        let next = reduce_action(
            &state,
            &Action::SetChannelParams {
                track_id: TrackId::new("A"),
                channel_id: ChannelId::new("A-vocal"),
                params: ChannelParams {
                    volume: 0.5,
                    offset: 0,
                },
            },
        );
        let t = &next.tracks[&TrackId::new("A")];
        assert_eq!(t.channels.len(), 2);
        assert_eq!(t.channel_params(&ChannelId::new("A-vocal")).unwrap().volume, 0.5);
    }

    #[test]
    fn select_cue_loads_chunks_and_plays() {
        let state = with_tracks(&["A"]);
        let cue = Cue {
            chunks: vec![Chunk::new(100, 50)],
        };
        let state = reduce_action(
            &state,
            &Action::AddCue {
                track_id: TrackId::new("A"),
                cue: cue.clone(),
                index: None,
            },
        );
        let next = reduce_action(
            &state,
            &Action::SelectCue {
                track_id: TrackId::new("A"),
                index: 0,
            },
        );
        let p = &next.tracks[&TrackId::new("A")].playback;
        assert_eq!(p.chunks, cue.chunks);
        assert_eq!(p.chunk_index, Some(0));
        assert!(p.playing);
    }

    #[test]
    fn display_only_times_touch_timing_only() {
        let state = with_tracks(&["A"]);
        let mut timing = TimingState {
            time: 512.0,
            ..Default::default()
        };
        timing.channels.insert(
            MixTrackId::new("A", "A"),
            ChannelTiming {
                sample: 12.0,
                playing: true,
                chunk_index: Some(3),
            },
        );
        let next = reduce_action(
            &state,
            &Action::UpdateTimes {
                timing: timing.clone(),
                commit: false,
            },
        );
        assert_eq!(next.timing, timing);
        let a = TrackId::new("A");
        assert!(Arc::ptr_eq(&state.tracks[&a], &next.tracks[&a]));
    }

    #[test]
    fn committed_times_write_chunk_index() {
        let state = with_tracks(&["A"]);
        let mut timing = TimingState::default();
        timing.channels.insert(
            MixTrackId::new("A", "A"),
            ChannelTiming {
                sample: 12.0,
                playing: true,
                chunk_index: Some(3),
            },
        );
        let next = reduce_action(
            &state,
            &Action::UpdateTimes {
                timing,
                commit: true,
            },
        );
        let t = &next.tracks[&TrackId::new("A")];
        assert_eq!(t.playback.chunk_index, Some(3));
        assert!(!t.playback.playing);
    }

    #[test]
    fn committed_times_move_only_the_addressed_track() {
        let mut state = Snapshot::new();
        for id in ["A", "B"] {
            let track = Track::new(TrackId::new(id), SourceId::new("shared"))
                .with_channel(ChannelId::new("main"), ChannelParams::default());
            state = reduce_action(
                &state,
                &Action::AddTrack {
                    track,
                    scene_index: None,
                },
            );
        }
        let mut timing = TimingState::default();
        timing.channels.insert(
            MixTrackId::new("B", "main"),
            ChannelTiming {
                sample: 0.0,
                playing: true,
                chunk_index: Some(2),
            },
        );
        let next = reduce_action(
            &state,
            &Action::UpdateTimes {
                timing,
                commit: true,
            },
        );
        let a = TrackId::new("A");
        assert!(Arc::ptr_eq(&state.tracks[&a], &next.tracks[&a]));
        assert_eq!(next.tracks[&TrackId::new("B")].playback.chunk_index, Some(2));
    }
}
