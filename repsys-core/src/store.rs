//! State store abstraction.
//!
//! The store owns the current snapshot, applies actions through the pure
//! reducers, and notifies listeners synchronously after every dispatch.

use std::sync::Arc;

use repsys_types::reduce::reduce_action;
use repsys_types::{Action, Snapshot};

/// Listener invoked with each committed snapshot.
pub type Listener = Box<dyn FnMut(&Arc<Snapshot>)>;

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Trait for the application-state store the reconciler subscribes to.
///
/// Implementations can be local (reducers run in-process) or fronts for a
/// store living elsewhere.
pub trait Store {
    /// The latest committed snapshot.
    fn state(&self) -> Arc<Snapshot>;

    /// Apply an action, then notify every listener.
    fn dispatch(&mut self, action: &Action);

    fn subscribe(&mut self, listener: Listener) -> Subscription;

    /// Returns false if the subscription was already gone.
    fn unsubscribe(&mut self, subscription: Subscription) -> bool;
}

/// In-process store built on `reduce_action`.
pub struct LocalStore {
    state: Arc<Snapshot>,
    listeners: Vec<(Subscription, Listener)>,
    next_id: u64,
    commits: u64,
}

impl LocalStore {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            state: Arc::new(initial),
            listeners: Vec::new(),
            next_id: 0,
            commits: 0,
        }
    }

    /// Number of dispatches committed so far.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new(Snapshot::default())
    }
}

impl Store for LocalStore {
    fn state(&self) -> Arc<Snapshot> {
        Arc::clone(&self.state)
    }

    fn dispatch(&mut self, action: &Action) {
        if !action.is_telemetry() {
            log::debug!(target: "store", "dispatch {}", action.name());
        }
        self.state = Arc::new(reduce_action(&self.state, action));
        self.commits += 1;
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }

    fn subscribe(&mut self, listener: Listener) -> Subscription {
        let sub = Subscription(self.next_id);
        self.next_id += 1;
        self.listeners.push((sub, listener));
        sub
    }

    fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(s, _)| *s != subscription);
        self.listeners.len() != before
    }
}
