use super::with_track;
use crate::{Snapshot, TimingState, TrackId};

/// Telemetry always replaces the timing section. A committed update also
/// moves each reporting channel's owning track to the reported chunk. Channels
/// reporting no chunk are ignored; tracks already at the chunk stay pointer-equal.
pub(super) fn reduce(timing: &TimingState, commit: bool, state: &mut Snapshot) {
    state.timing = timing.clone();
    if !commit {
        return;
    }

    let moves: Vec<(TrackId, u32)> = timing
        .channels
        .iter()
        .filter_map(|(channel, reported)| {
            let chunk_index = reported.chunk_index?;
            let owner = state.owner_of(channel)?;
            (owner.playback.chunk_index != Some(chunk_index))
                .then(|| (owner.id.clone(), chunk_index))
        })
        .collect();

    for (track_id, chunk_index) in moves {
        with_track(state, &track_id, |t| t.playback.chunk_index = Some(chunk_index));
    }
}
