//! # repsys-engine
//!
//! The narrow command/telemetry surface into the audio engine.
//!
//! The engine itself (mixing, time-stretch, source separation) lives outside
//! this workspace. This crate defines what the reconciler is allowed to ask of
//! it ([`EngineAdapter`]), the sparse parameter payload it speaks
//! ([`Patch`]), a typed command value ([`EngineCommand`]), and the bookkeeping
//! of which engine-side ids are alive ([`LiveRegistry`]).
//!
//! [`TestEngine`] records every call and simulates the engine's parameter
//! image for assertions; [`NullEngine`] only logs and keeps a clock.

pub mod adapter;
pub mod command;
pub mod null;
pub mod patch;
pub mod registry;
pub mod test_engine;

pub use adapter::{EngineAdapter, EngineError, EngineResult};
pub use command::EngineCommand;
pub use null::NullEngine;
pub use patch::Patch;
pub use registry::{LiveRegistry, StaleReason, StaleTarget};
pub use test_engine::{EngineOp, TestEngine};

/// Engine sample rate. Chunk bounds, offsets and telemetry are in samples at this rate.
pub const SAMPLE_RATE: u32 = 44_100;
