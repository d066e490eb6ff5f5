//! Telemetry worker.
//!
//! Polls `get_timing` on a fixed period from its own thread and delivers the
//! results over a channel to the single reconciliation task, which absorbs
//! them into the shadow baseline before dispatching. The worker never touches
//! state itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use repsys_engine::{EngineAdapter, EngineResult};
use repsys_types::TimingState;

/// Message from the worker: one timing read, or the engine error that ended it.
pub type TelemetryMsg = EngineResult<TimingState>;

pub struct TelemetryPoller {
    stop_tx: Sender<()>,
    join_handle: Option<JoinHandle<()>>,
}

impl TelemetryPoller {
    /// Spawn the worker. It polls while `transport_running` is set (always,
    /// with `poll_while_stopped`), and exits after an engine error, on
    /// `stop()`, or when the receiving side hangs up.
    pub fn spawn(
        engine: Arc<dyn EngineAdapter>,
        period: Duration,
        transport_running: Arc<AtomicBool>,
        poll_while_stopped: bool,
        tx: Sender<TelemetryMsg>,
    ) -> Self {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let join_handle = thread::spawn(move || {
            poll_loop(engine, period, transport_running, poll_while_stopped, tx, stop_rx);
        });
        log::debug!(target: "telemetry", "poller started, period {:?}", period);
        Self {
            stop_tx,
            join_handle: Some(join_handle),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop the worker and wait for it to exit.
    pub fn stop(&mut self) {
        let _ = self.stop_tx.try_send(());
        if let Some(handle) = self.join_handle.take() {
            if handle.join().is_err() {
                log::error!(target: "telemetry", "poller thread panicked");
            }
        }
    }
}

impl Drop for TelemetryPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_loop(
    engine: Arc<dyn EngineAdapter>,
    period: Duration,
    transport_running: Arc<AtomicBool>,
    poll_while_stopped: bool,
    tx: Sender<TelemetryMsg>,
    stop_rx: Receiver<()>,
) {
    let ticker = crossbeam_channel::tick(period);
    loop {
        crossbeam_channel::select! {
            recv(stop_rx) -> _ => break,
            recv(ticker) -> _ => {
                if !poll_while_stopped && !transport_running.load(Ordering::Relaxed) {
                    continue;
                }
                let result = engine.get_timing();
                let failed = result.is_err();
                if tx.send(result).is_err() {
                    break; // Receiver gone
                }
                if failed {
                    log::warn!(target: "telemetry", "engine read failed, poller exiting");
                    break;
                }
            }
        }
    }
    log::debug!(target: "telemetry", "poller stopped");
}
