//! Runtime: the single reconciliation task.
//!
//! Owns the store, the reconciler and (optionally) the telemetry worker, and
//! services UI actions and telemetry one at a time, so a tick always runs to
//! completion before the next message is handled.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use repsys_engine::EngineAdapter;
use repsys_types::{Action, Snapshot, TimingState};

use crate::config::Config;
use crate::reconciler::{ReconcileError, ReconcileResult, Reconciler, TickReport};
use crate::store::{LocalStore, Store};
use crate::telemetry::{TelemetryMsg, TelemetryPoller};

enum RuntimeMsg {
    Dispatch(Action),
    Shutdown,
}

/// Clonable sender for other threads (UI, control surfaces).
#[derive(Clone)]
pub struct RuntimeHandle {
    tx: Sender<RuntimeMsg>,
}

impl RuntimeHandle {
    /// Fire-and-forget: queue an action and log if the runtime is gone.
    pub fn dispatch(&self, action: Action) {
        if self.tx.send(RuntimeMsg::Dispatch(action)).is_err() {
            log::warn!(target: "runtime", "action dropped: runtime stopped");
        }
    }

    /// Ask `run()` to return after the message currently being handled.
    pub fn shutdown(&self) {
        let _ = self.tx.send(RuntimeMsg::Shutdown);
    }
}

pub struct Runtime {
    store: LocalStore,
    reconciler: Rc<RefCell<Reconciler>>,
    poller: Option<TelemetryPoller>,
    msg_tx: Sender<RuntimeMsg>,
    msg_rx: Receiver<RuntimeMsg>,
    telemetry_tx: Sender<TelemetryMsg>,
    telemetry_rx: Receiver<TelemetryMsg>,
    period: Duration,
    poll_while_stopped: bool,
}

impl Runtime {
    /// Initialize the engine, subscribe the reconciler to a store holding
    /// `initial`, run the first tick, then start the engine.
    pub fn new(engine: Arc<dyn EngineAdapter>, config: &Config, initial: Snapshot) -> ReconcileResult<Self> {
        let reconciler = Rc::new(RefCell::new(Reconciler::new(engine, &config.base_path())?));
        let mut store = LocalStore::new(initial);

        let listener = Rc::clone(&reconciler);
        store.subscribe(Box::new(move |snapshot: &Arc<Snapshot>| {
            let mut reconciler = listener.borrow_mut();
            if reconciler.is_halted() {
                return;
            }
            // The report is kept as `last_report`; a failure is kept as the
            // fault and surfaced by `ensure_running`.
            if let Err(err) = reconciler.on_commit(snapshot) {
                log::debug!(target: "runtime", "store-driven tick failed: {}", err);
            }
        }));

        reconciler.borrow_mut().on_commit(&store.state())?;
        reconciler.borrow_mut().start()?;

        let (msg_tx, msg_rx) = crossbeam_channel::unbounded();
        let (telemetry_tx, telemetry_rx) = crossbeam_channel::unbounded();
        Ok(Self {
            store,
            reconciler,
            poller: None,
            msg_tx,
            msg_rx,
            telemetry_tx,
            telemetry_rx,
            period: config.telemetry_period(),
            poll_while_stopped: config.poll_while_stopped(),
        })
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            tx: self.msg_tx.clone(),
        }
    }

    pub fn state(&self) -> Arc<Snapshot> {
        self.store.state()
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn reconciler(&self) -> std::cell::Ref<'_, Reconciler> {
        self.reconciler.borrow()
    }

    /// What the tick of the most recent commit sent and reported.
    pub fn last_report(&self) -> Option<TickReport> {
        self.reconciler.borrow().last_report().cloned()
    }

    /// Dispatch an action on this task. Errors if the tick it triggered (or an
    /// earlier one) halted the reconciler.
    pub fn dispatch(&mut self, action: Action) -> ReconcileResult {
        self.ensure_running()?;
        self.store.dispatch(&action);
        self.ensure_running()
    }

    /// Absorb a timing read and publish it. The shadow baseline is updated
    /// before the dispatch re-enters the reconciler through the listener.
    pub fn apply_timing(&mut self, timing: TimingState) -> ReconcileResult {
        let action = self.reconciler.borrow_mut().absorb_timing(timing);
        match action {
            Some(action) => self.dispatch(action),
            None => self.ensure_running(),
        }
    }

    /// One synchronous telemetry poll, subject to the transport gate.
    /// Returns true if an update was dispatched.
    pub fn poll_once(&mut self) -> ReconcileResult<bool> {
        if !self.should_poll() {
            return Ok(false);
        }
        let action = self.reconciler.borrow_mut().poll_telemetry()?;
        match action {
            Some(action) => {
                self.dispatch(action)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Start the telemetry worker thread. No-op if it is already running.
    pub fn spawn_poller(&mut self) {
        if self.poller.as_ref().is_some_and(|p| !p.is_finished()) {
            return;
        }
        let (engine, running) = {
            let reconciler = self.reconciler.borrow();
            (Arc::clone(reconciler.engine()), reconciler.transport_running())
        };
        self.poller = Some(TelemetryPoller::spawn(
            engine,
            self.period,
            running,
            self.poll_while_stopped,
            self.telemetry_tx.clone(),
        ));
    }

    pub fn stop_poller(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
    }

    /// Handle everything already queued without blocking. Returns the number
    /// of messages handled.
    pub fn pump(&mut self) -> ReconcileResult<usize> {
        let mut handled = 0;
        loop {
            match self.msg_rx.try_recv() {
                Ok(RuntimeMsg::Dispatch(action)) => self.dispatch(action)?,
                Ok(RuntimeMsg::Shutdown) | Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
            handled += 1;
        }
        while let Ok(msg) = self.telemetry_rx.try_recv() {
            self.handle_telemetry(msg)?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Service actions and telemetry until `shutdown()` is requested or the
    /// reconciler halts. Spawns the telemetry worker if needed.
    pub fn run(&mut self) -> ReconcileResult {
        self.spawn_poller();
        log::info!(target: "runtime", "running");
        let result = self.run_loop();
        self.stop_poller();
        match &result {
            Ok(()) => log::info!(target: "runtime", "stopped"),
            Err(e) => log::error!(target: "runtime", "stopped: {}", e),
        }
        result
    }

    fn run_loop(&mut self) -> ReconcileResult {
        loop {
            crossbeam_channel::select! {
                recv(self.msg_rx) -> msg => match msg {
                    Ok(RuntimeMsg::Dispatch(action)) => self.dispatch(action)?,
                    Ok(RuntimeMsg::Shutdown) | Err(_) => return Ok(()),
                },
                recv(self.telemetry_rx) -> msg => {
                    if let Ok(msg) = msg {
                        self.handle_telemetry(msg)?;
                    }
                }
            }
        }
    }

    fn handle_telemetry(&mut self, msg: TelemetryMsg) -> ReconcileResult {
        match msg {
            Ok(timing) => self.apply_timing(timing),
            Err(err) => Err(self.reconciler.borrow_mut().halt(err)),
        }
    }

    fn should_poll(&self) -> bool {
        self.poll_while_stopped || self.store.state().playback.playing
    }

    fn ensure_running(&self) -> ReconcileResult {
        let reconciler = self.reconciler.borrow();
        match reconciler.fault() {
            Some(err) => Err(ReconcileError::EngineUnreachable(err.clone())),
            None if reconciler.is_halted() => Err(ReconcileError::Halted),
            None => Ok(()),
        }
    }
}
