//! A logging engine that keeps a transport clock and nothing else. Used when
//! no real engine binding is available (headless runs, demos).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use repsys_types::{ChannelTiming, MixTrackId, SampleBuffer, TimingState, TrackId};

use crate::{EngineAdapter, EngineResult, Patch, SAMPLE_RATE};

#[derive(Default)]
struct Clock {
    started_at: Option<Instant>,
    playing: bool,
    channels: BTreeMap<MixTrackId, bool>,
}

/// Engine that succeeds at everything, logs each call at debug level under
/// the `engine` target, and reports elapsed transport time.
#[derive(Default)]
pub struct NullEngine {
    clock: Mutex<Clock>,
}

impl NullEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn clock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EngineAdapter for NullEngine {
    fn init(&self, base_path: &Path) -> EngineResult {
        log::debug!(target: "engine", "init({})", base_path.display());
        Ok(())
    }

    fn start(&self) -> EngineResult {
        log::debug!(target: "engine", "start()");
        self.clock().started_at = Some(Instant::now());
        Ok(())
    }

    fn add_source(&self, id: &TrackId, buffer: &SampleBuffer) -> EngineResult {
        log::debug!(target: "engine", "add_source({}, {:?})", id, buffer);
        Ok(())
    }

    fn remove_source(&self, id: &TrackId) -> EngineResult {
        log::debug!(target: "engine", "remove_source({})", id);
        Ok(())
    }

    fn set_mix_track(&self, id: &MixTrackId, patch: &Patch) -> EngineResult {
        log::debug!(target: "engine", "set_mix_track({}, {})", id, patch);
        let mut clock = self.clock();
        let playing = patch.get("playing").and_then(|v| v.as_bool());
        let entry = clock.channels.entry(id.clone()).or_insert(false);
        if let Some(playing) = playing {
            *entry = playing;
        }
        Ok(())
    }

    fn remove_mix_track(&self, id: &MixTrackId) -> EngineResult {
        log::debug!(target: "engine", "remove_mix_track({})", id);
        self.clock().channels.remove(id);
        Ok(())
    }

    fn update_playback(&self, patch: &Patch) -> EngineResult {
        log::debug!(target: "engine", "update_playback({})", patch);
        if let Some(playing) = patch.get("playing").and_then(|v| v.as_bool()) {
            self.clock().playing = playing;
        }
        Ok(())
    }

    fn get_timing(&self) -> EngineResult<TimingState> {
        let clock = self.clock();
        let time = match (clock.started_at, clock.playing) {
            (Some(t0), true) => t0.elapsed().as_secs_f64() * f64::from(SAMPLE_RATE),
            _ => 0.0,
        };
        let channels = clock
            .channels
            .iter()
            .map(|(id, playing)| {
                let timing = ChannelTiming {
                    sample: if *playing { time } else { 0.0 },
                    playing: *playing && clock.playing,
                    chunk_index: None,
                };
                (id.clone(), timing)
            })
            .collect();
        Ok(TimingState { time, channels })
    }
}
