//! Configuration monitor double that records every call for assertions.
//!
//! The monitor also tracks whether a notification is being dispatched so
//! tests can prove the coordinator never calls back into the monitor from
//! inside its own notification.

use std::sync::{Arc, Mutex};

use crate::monitor::{ConfigMonitor, ListenerId, SubscribeError};
use crate::status::ErrorCode;
use crate::topology::ConfigHandle;

/// Shared, ordered log of collaborator side effects.
pub type Journal = Arc<Mutex<Vec<String>>>;

/// Snapshot of the monitor call counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MonitorCalls {
    pub prepares: usize,
    pub starts: usize,
    pub subscribes: usize,
    pub unsubscribes: usize,
    pub best_config_queries: usize,
    pub reentrant_calls: usize,
}

#[derive(Default)]
struct MonitorState {
    calls: MonitorCalls,
    listeners: Vec<ListenerId>,
    next_listener: u64,
    last_error: ErrorCode,
    best: Option<ConfigHandle>,
    refuse_subscriptions: bool,
    notifying: bool,
}

/// Monitor handle; clones share state.
#[derive(Clone, Default)]
pub struct RecordingMonitor {
    state: Arc<Mutex<MonitorState>>,
    journal: Journal,
}

impl RecordingMonitor {
    /// Builds a monitor that appends unsubscriptions to `journal`.
    #[must_use]
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            state: Arc::default(),
            journal,
        }
    }

    /// Makes every later `subscribe` call fail.
    pub fn refuse_subscriptions(&self) {
        self.with_state(|state| state.refuse_subscriptions = true);
    }

    /// Sets the value returned by `last_error`.
    pub fn set_last_error(&self, error: ErrorCode) {
        self.with_state(|state| state.last_error = error);
    }

    /// Sets the value returned by `best_known_config`.
    pub fn set_best_config(&self, config: Option<ConfigHandle>) {
        self.with_state(|state| state.best = config);
    }

    /// Listeners currently subscribed.
    #[must_use]
    pub fn listeners(&self) -> Vec<ListenerId> {
        self.with_state(|state| state.listeners.clone())
    }

    /// Snapshot of the call counters.
    #[must_use]
    pub fn calls(&self) -> MonitorCalls {
        self.with_state(|state| state.calls.clone())
    }

    /// Marks the start or end of a notification dispatch.
    pub fn set_notifying(&self, notifying: bool) {
        self.with_state(|state| state.notifying = notifying);
    }

    fn with_state<R>(&self, action: impl FnOnce(&mut MonitorState) -> R) -> R {
        let mut state = self.state.lock().expect("monitor state mutex poisoned");
        action(&mut state)
    }

    fn enter<R>(&self, action: impl FnOnce(&mut MonitorState) -> R) -> R {
        self.with_state(|state| {
            if state.notifying {
                state.calls.reentrant_calls += 1;
            }
            action(state)
        })
    }
}

impl ConfigMonitor for RecordingMonitor {
    fn prepare(&self) {
        self.enter(|state| state.calls.prepares += 1);
    }

    fn start(&self) {
        self.enter(|state| state.calls.starts += 1);
    }

    fn subscribe(&self) -> Result<ListenerId, SubscribeError> {
        self.enter(|state| {
            if state.refuse_subscriptions {
                return Err(SubscribeError::ListenerTableFull { capacity: 0 });
            }
            state.calls.subscribes += 1;
            state.next_listener += 1;
            let listener = ListenerId::new(state.next_listener);
            state.listeners.push(listener);
            Ok(listener)
        })
    }

    fn unsubscribe(&self, listener: ListenerId) {
        self.enter(|state| {
            state.calls.unsubscribes += 1;
            state.listeners.retain(|existing| *existing != listener);
        });
        self.journal
            .lock()
            .expect("journal mutex poisoned")
            .push(format!("unsubscribe {listener}"));
    }

    fn last_error(&self) -> ErrorCode {
        self.with_state(|state| state.last_error)
    }

    fn best_known_config(&self) -> Option<ConfigHandle> {
        self.enter(|state| {
            state.calls.best_config_queries += 1;
            state.best.clone()
        })
    }
}
