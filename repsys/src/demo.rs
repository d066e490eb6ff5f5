//! Scripted session: what a user would do from the UI, driven through a
//! `RuntimeHandle` from its own thread.

use std::f32::consts::TAU;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use repsys_core::RuntimeHandle;
use repsys_engine::SAMPLE_RATE;
use repsys_types::{
    Action, ChannelId, ChannelParams, Chunk, Cue, GlobalPlaybackUpdate, SampleBuffer, Source,
    SourceId, Track, TrackId,
};

/// One second of a stereo sine at `freq`.
fn tone(freq: f32) -> SampleBuffer {
    let frames = SAMPLE_RATE as usize;
    let channel: Vec<f32> = (0..frames)
        .map(|i| (TAU * freq * i as f32 / SAMPLE_RATE as f32).sin() * 0.5)
        .collect();
    SampleBuffer::new(vec![channel.clone(), channel])
}

fn loop_track(id: &str, freq: f32) -> Vec<Action> {
    let source = SourceId::new(id);
    let mut track = Track::new(TrackId::new(id), source.clone())
        .with_channel(ChannelId::new(id), ChannelParams::default());
    let half = u64::from(SAMPLE_RATE) / 2;
    track.cues.push(Cue {
        chunks: vec![Chunk::new(0, half), Chunk::new(half, half)],
    });
    vec![
        Action::AddSource(Source::new(source, tone(freq))),
        Action::AddTrack {
            track,
            scene_index: None,
        },
        Action::SelectCue {
            track_id: TrackId::new(id),
            index: 0,
        },
    ]
}

/// Build two looping tracks, start the transport, solo one for a while, then
/// remove it and shut the runtime down after `length`.
pub fn spawn(handle: RuntimeHandle, length: Duration) -> JoinHandle<()> {
    thread::spawn(move || {
        for action in loop_track("drums", 110.0).into_iter().chain(loop_track("bass", 55.0)) {
            handle.dispatch(action);
        }
        handle.dispatch(Action::UpdatePlayback(GlobalPlaybackUpdate {
            playing: Some(true),
            ..Default::default()
        }));

        let step = length / 4;
        thread::sleep(step);
        handle.dispatch(Action::SetTrackSolo {
            track_id: TrackId::new("bass"),
            solo: true,
        });
        thread::sleep(step);
        handle.dispatch(Action::SetTrackSolo {
            track_id: TrackId::new("bass"),
            solo: false,
        });
        handle.dispatch(Action::RemoveTrack(TrackId::new("drums")));
        thread::sleep(step * 2);

        handle.shutdown();
    })
}
