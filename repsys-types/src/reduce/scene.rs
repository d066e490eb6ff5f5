use crate::{Action, Scene, Snapshot};

pub(super) fn reduce(action: &Action, state: &mut Snapshot) {
    match action {
        Action::SetSceneIndex(index) => {
            if *index < state.scenes.len() {
                state.scene_index = *index;
            }
        }
        Action::CreateScene(index) => {
            let at = (*index).min(state.scenes.len());
            state.scenes.insert(at, Scene::default());
            // keep the same scene current
            if at <= state.scene_index && state.scenes.len() > 1 {
                state.scene_index += 1;
            }
        }
        Action::DeleteScene(index) => {
            if state.scenes.len() <= 1 || *index >= state.scenes.len() {
                return;
            }
            let removed = state.scenes.remove(*index);
            for id in &removed.tracks {
                state.tracks.remove(id);
            }
            if state.scene_index > *index {
                state.scene_index -= 1;
            }
            state.scene_index = state.scene_index.min(state.scenes.len() - 1);
        }
        Action::MoveTrackToScene {
            track_id,
            to_scene,
            index,
        } => {
            if !state.tracks.contains_key(track_id) {
                return;
            }
            for scene in &mut state.scenes {
                scene.tracks.retain(|id| id != track_id);
            }
            if state.scenes.len() <= *to_scene {
                state.scenes.resize_with(to_scene + 1, Scene::default);
            }
            let tracks = &mut state.scenes[*to_scene].tracks;
            let at = index.unwrap_or(tracks.len()).min(tracks.len());
            tracks.insert(at, track_id.clone());
        }
        _ => {}
    }
}
