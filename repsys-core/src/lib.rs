//! # repsys-core
//!
//! Reconciliation between the repsys application state and the audio engine.
//! Keeps the engine's sources, mix channels and transport consistent with the
//! latest committed snapshot, and pulls engine timing back into state without
//! echoing it to the engine.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use repsys_core::config::Config;
//! use repsys_core::runtime::Runtime;
//! use repsys_engine::NullEngine;
//! use repsys_types::Snapshot;
//!
//! // 1. Load config (embedded defaults + user override)
//! let config = Config::load();
//!
//! // 2. Build the runtime: inits the engine, runs the first tick, starts it
//! let mut runtime = Runtime::new(Arc::new(NullEngine::new()), &config, Snapshot::new())?;
//!
//! // 3. Hand a RuntimeHandle to the UI thread, then service actions and telemetry
//! let handle = runtime.handle();
//! runtime.run()?;
//! ```
//!
//! ## Module Overview
//!
//! - [`equality`]: deep equality over engine records, identity fast path
//! - [`diff`]: sparse patches between two records (additive only)
//! - [`lifecycle`]: created / removed / retained sets per entity class
//! - [`projection`]: snapshot entities as engine records (camelCase fields)
//! - [`plan`]: `plan_tick()`: ordered commands for one commit
//! - [`reconciler`]: `Reconciler` state machine, baseline, anti-echo telemetry absorb
//! - [`store`]: `Store` trait and the in-process `LocalStore`
//! - [`telemetry`]: `TelemetryPoller` worker thread
//! - [`runtime`]: `Runtime` loop and `RuntimeHandle`
//! - [`config`]: TOML configuration (embedded + user override)

pub mod config;
pub mod diagnostic;
pub mod diff;
pub mod equality;
pub mod lifecycle;
pub mod plan;
pub mod projection;
pub mod reconciler;
pub mod runtime;
pub mod store;
pub mod telemetry;

pub use diagnostic::Diagnostic;
pub use plan::{plan_tick, TickPlan};
pub use reconciler::{ReconcileError, ReconcileResult, Reconciler, ReconcilerState, TickReport};
pub use runtime::{Runtime, RuntimeHandle};
pub use store::{LocalStore, Store, Subscription};
