//! Engine adapter trait: the command surface the reconciler drives.
//!
//! `EngineAdapter` captures what the reconciler *means* to do (register a
//! source, patch a mix channel) independently of how the engine binding does
//! it. This keeps the reconciliation logic testable without a running engine.

use std::path::Path;

use thiserror::Error;

use repsys_types::{MixTrackId, SampleBuffer, TimingState, TrackId};

use crate::Patch;

/// Result type for engine calls.
pub type EngineResult<T = ()> = Result<T, EngineError>;

/// Error from an engine call. Every variant is fatal to the reconciler: calls
/// are not retried and already-issued commands are not rolled back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The engine could not be reached (binding torn down, process gone).
    #[error("engine unreachable: {0}")]
    Unreachable(String),

    /// The engine refused a call it was able to receive.
    #[error("engine rejected {call}: {reason}")]
    Rejected { call: &'static str, reason: String },

    /// A call other than `init` was made before `init`.
    #[error("engine used before init")]
    NotInitialized,
}

/// Synchronous command/telemetry surface of the engine.
///
/// All calls return immediately from the caller's point of view. Mutation
/// calls are fire-and-forget; `get_timing` is a bounded read.
pub trait EngineAdapter: Send + Sync {
    /// One-time setup. Must precede every other call.
    fn init(&self, base_path: &Path) -> EngineResult;

    /// Begin real-time processing.
    fn start(&self) -> EngineResult;

    /// Register a track's source under the track id, so two tracks playing
    /// the same buffer hold separate engine sources. Registering a live id
    /// again is undefined.
    fn add_source(&self, id: &TrackId, buffer: &SampleBuffer) -> EngineResult;

    /// Unregister a source. Removing an absent id is undefined.
    fn remove_source(&self, id: &TrackId) -> EngineResult;

    /// Apply a sparse parameter patch to a mix channel, creating it on first
    /// use. Only the provided fields change; values are absolute.
    fn set_mix_track(&self, id: &MixTrackId, patch: &Patch) -> EngineResult;

    /// Unregister a mix channel.
    fn remove_mix_track(&self, id: &MixTrackId) -> EngineResult;

    /// Apply a sparse patch to the global transport/volume parameters.
    fn update_playback(&self, patch: &Patch) -> EngineResult;

    /// Current transport time and per-channel playback positions.
    fn get_timing(&self) -> EngineResult<TimingState>;
}
