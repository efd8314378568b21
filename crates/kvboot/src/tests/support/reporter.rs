//! Test double for [`BootstrapReporter`] that records structured events.

use std::sync::Mutex;

use crate::bootstrap::{BootstrapError, ListenerMode};
use crate::health::BootstrapReporter;
use crate::status::ErrorCode;
use crate::topology::ConfigHandle;

/// Lifecycle events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BootstrapEvent {
    Started(ListenerMode),
    Coalesced(ListenerMode),
    Failed(String),
    RefreshDeferred,
    Applied(u64),
    DeadlineElapsed(ErrorCode),
    ThresholdReached(u32),
    Destroyed,
}

/// Records reporter events for assertions.
#[derive(Debug, Default)]
pub struct RecordingBootstrapReporter {
    events: Mutex<Vec<BootstrapEvent>>,
}

impl RecordingBootstrapReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<BootstrapEvent> {
        self.events
            .lock()
            .expect("bootstrap reporter mutex poisoned")
            .clone()
    }

    /// Number of recorded events equal to `event`.
    #[must_use]
    pub fn count(&self, event: &BootstrapEvent) -> usize {
        self.events()
            .iter()
            .filter(|recorded| *recorded == event)
            .count()
    }

    fn record(&self, event: BootstrapEvent) {
        self.events
            .lock()
            .expect("bootstrap reporter mutex poisoned")
            .push(event);
    }
}

impl BootstrapReporter for RecordingBootstrapReporter {
    fn bootstrap_started(&self, mode: ListenerMode) {
        self.record(BootstrapEvent::Started(mode));
    }

    fn bootstrap_coalesced(&self, mode: ListenerMode) {
        self.record(BootstrapEvent::Coalesced(mode));
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(BootstrapEvent::Failed(error.to_string()));
    }

    fn refresh_deferred(&self) {
        self.record(BootstrapEvent::RefreshDeferred);
    }

    fn configuration_applied(&self, config: &ConfigHandle) {
        self.record(BootstrapEvent::Applied(config.revision()));
    }

    fn deadline_elapsed(&self, error: ErrorCode) {
        self.record(BootstrapEvent::DeadlineElapsed(error));
    }

    fn error_threshold_reached(&self, threshold: u32) {
        self.record(BootstrapEvent::ThresholdReached(threshold));
    }

    fn capsule_destroyed(&self) {
        self.record(BootstrapEvent::Destroyed);
    }
}
