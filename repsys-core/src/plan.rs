//! Planning of one reconciliation tick.
//!
//! `plan_tick` is pure: it compares the baseline snapshot against the new one,
//! consults the registry of live engine ids, and returns the ordered command
//! list plus any anomalies found. Order within a tick:
//!
//! 1. global playback update
//! 2. removed tracks: channels first, then the source
//! 3. retained tracks: per-channel removals, updates, additions
//! 4. created tracks: the source, then each channel with its full parameters
//!
//! Removals run before retained and created tracks so an engine id that
//! leaves and re-enters within one transition (a track whose source changed,
//! a track reinstated after a skipped tick) is freed before it is added again.
//!
//! Engine sources are registered per track under the track id, and mix
//! channels are addressed as [`MixTrackId`] (track plus channel), so tracks
//! sharing a buffer or a channel name never collide in the engine.

use std::hash::Hash;
use std::sync::Arc;

use repsys_engine::{EngineCommand, LiveRegistry};
use repsys_types::{ChannelId, MixTrackId, Snapshot, Track, TrackId};

use crate::diagnostic::Diagnostic;
use crate::diff::diff_records;
use crate::equality::same;
use crate::lifecycle::{self, Lifecycle};
use crate::projection::{channel_record, global_record, initial_channel_params, transport_record};

/// Ordered commands for one tick, plus anomalies found while planning.
#[derive(Debug, Clone, Default)]
pub struct TickPlan {
    pub commands: Vec<EngineCommand>,
    pub diagnostics: Vec<Diagnostic>,
}

impl TickPlan {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Plan the commands that bring the engine from `baseline` to `current`.
/// `baseline: None` is the first tick: everything is created.
pub fn plan_tick(baseline: Option<&Snapshot>, current: &Snapshot, live: &LiveRegistry) -> TickPlan {
    let mut planner = Planner {
        baseline,
        current,
        live,
        prev_solo: baseline.is_some_and(Snapshot::solo_active),
        cur_solo: current.solo_active(),
        plan: TickPlan::default(),
    };
    planner.global();
    planner.tracks();
    planner.plan
}

struct Planner<'a> {
    baseline: Option<&'a Snapshot>,
    current: &'a Snapshot,
    live: &'a LiveRegistry,
    prev_solo: bool,
    cur_solo: bool,
    plan: TickPlan,
}

impl<'a> Planner<'a> {
    fn push(&mut self, cmd: EngineCommand) {
        self.plan.commands.push(cmd);
    }

    fn diag(&mut self, diagnostic: Diagnostic) {
        self.plan.diagnostics.push(diagnostic);
    }

    fn global(&mut self) {
        let prev = match self.baseline {
            Some(b) if same(&b.playback, &self.current.playback) => return,
            Some(b) => Some(global_record(&b.playback)),
            None => None,
        };
        let patch = diff_records(prev.as_ref(), &global_record(&self.current.playback));
        if !patch.is_empty() {
            self.push(EngineCommand::UpdatePlayback(patch));
        }
    }

    fn tracks(&mut self) {
        let prev_ids = self.baseline.map_or(&[][..], Snapshot::current_track_ids);
        let mut lc = lifecycle::track(prev_ids, self.current.current_track_ids());
        self.report_lifecycle(&mut lc);

        for id in &lc.removed {
            self.remove_track(id);
        }

        let mut created = Vec::new();
        for id in &lc.retained {
            let Some(cur) = self.current.track(id) else {
                self.diag(Diagnostic::MissingTrack(id.clone()));
                continue;
            };
            let prev = self.baseline.and_then(|b| b.track(id));
            match prev {
                Some(prev) if self.live.is_track_live(id) => {
                    if self.live.source_of(id) == Some(&cur.source) {
                        self.update_track(prev, cur);
                    } else {
                        self.remove_track(id);
                        created.push(id.clone());
                    }
                }
                // Skipped on an earlier tick, or its removal went stale.
                _ => created.push(id.clone()),
            }
        }
        created.extend(lc.created.iter().cloned());

        for id in &created {
            match self.current.track(id) {
                Some(track) => self.create_track(track),
                None => self.diag(Diagnostic::MissingTrack(id.clone())),
            }
        }
    }

    fn report_lifecycle<Id: Clone + Eq + Hash + ToString>(&mut self, lc: &mut Lifecycle<Id>) {
        for id in &lc.duplicates {
            self.plan.diagnostics.push(Diagnostic::DuplicateId(id.to_string()));
        }
        for id in lc.sanitize() {
            self.plan.diagnostics.push(Diagnostic::LifecycleConflict(id.to_string()));
        }
    }

    /// Remove whatever the engine holds for `id`: its channels in declared
    /// order, then its source.
    fn remove_track(&mut self, id: &TrackId) {
        let declared: &[ChannelId] = self
            .baseline
            .and_then(|b| b.track(id))
            .map_or(&[][..], |t| t.channels.as_slice());
        let mut channels = self.live.channels_of(id);
        channels.sort_by_key(|c| {
            declared
                .iter()
                .position(|d| *d == c.channel)
                .unwrap_or(usize::MAX)
        });
        for channel in channels {
            self.push(EngineCommand::RemoveChannel(channel));
        }
        if self.live.is_track_live(id) {
            self.push(EngineCommand::RemoveSource(id.clone()));
        }
    }

    fn create_track(&mut self, track: &Track) {
        let Some(source) = self.current.source(&track.source) else {
            self.diag(Diagnostic::MissingSource {
                track: track.id.clone(),
                source: track.source.clone(),
            });
            return;
        };
        self.push(EngineCommand::AddSource {
            track: track.id.clone(),
            source: track.source.clone(),
            buffer: source.buffer.clone(),
        });
        let mut channels = lifecycle::track(&[], &track.channels);
        self.report_lifecycle(&mut channels);
        for channel in &channels.created {
            self.add_channel(track, channel);
        }
    }

    fn add_channel(&mut self, track: &Track, channel: &ChannelId) {
        match initial_channel_params(track, channel, self.cur_solo) {
            Some(params) => self.push(EngineCommand::AddChannel {
                id: MixTrackId::new(track.id.clone(), channel.clone()),
                params,
            }),
            None => self.diag(Diagnostic::MissingChannelParams {
                track: track.id.clone(),
                channel: channel.clone(),
            }),
        }
    }

    /// Broadcast the transport patch to every channel present on both sides,
    /// merged with each channel's own routing patch.
    fn update_track(&mut self, prev: &Arc<Track>, cur: &Arc<Track>) {
        if same(prev, cur) && self.prev_solo == self.cur_solo {
            return;
        }
        let transport = diff_records(
            Some(&transport_record(prev, self.prev_solo)),
            &transport_record(cur, self.cur_solo),
        );

        let mut channels = lifecycle::track(&prev.channels, &cur.channels);
        self.report_lifecycle(&mut channels);

        for channel in &channels.removed {
            let id = MixTrackId::new(cur.id.clone(), channel.clone());
            if self.live.is_channel_live(&id) {
                self.push(EngineCommand::RemoveChannel(id));
            }
        }
        for channel in &channels.retained {
            let id = MixTrackId::new(cur.id.clone(), channel.clone());
            if !self.live.is_channel_live(&id) {
                self.add_channel(cur, channel);
                continue;
            }
            let Some(record) = channel_record(cur, channel) else {
                self.diag(Diagnostic::MissingChannelParams {
                    track: cur.id.clone(),
                    channel: channel.clone(),
                });
                continue;
            };
            let mut patch = transport.clone();
            patch.merge(diff_records(channel_record(prev, channel).as_ref(), &record));
            if !patch.is_empty() {
                self.push(EngineCommand::UpdateChannel { id, patch });
            }
        }
        for channel in &channels.created {
            self.add_channel(cur, channel);
        }
    }
}
