//! BDD test world: wires the coordinator to a virtual-time reactor, a
//! recording monitor and a recording instance, and plays the owning event
//! loop for step functions.

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use kvboot_config::Settings;

use crate::bootstrap::{Bootstrap, BootstrapError, BootstrapState};
use crate::reactor::ManualReactor;
use crate::topology::{ClusterConfig, ConfigHandle, ConfigSource};

use super::instance::TestInstance;
use super::monitor::RecordingMonitor;
use super::reporter::RecordingBootstrapReporter;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    pub reactor: ManualReactor,
    pub monitor: RecordingMonitor,
    pub reporter: Arc<RecordingBootstrapReporter>,
    pub instance: TestInstance,
    bootstrap: Bootstrap<RecordingMonitor, ManualReactor>,
    last_result: Option<Result<(), BootstrapError>>,
    next_revision: u64,
}

impl TestWorld {
    /// Builds a world with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Builds a world with the supplied settings.
    #[must_use]
    pub fn with_settings(settings: Settings) -> Self {
        let reactor = ManualReactor::new();
        let monitor = RecordingMonitor::default();
        let reporter = Arc::new(RecordingBootstrapReporter::default());
        let bootstrap = Bootstrap::new(monitor.clone(), reactor.clone(), reporter.clone());
        Self {
            reactor,
            monitor,
            reporter,
            instance: TestInstance::new(settings),
            bootstrap,
            last_result: None,
            next_revision: 0,
        }
    }

    /// Sets the initial configuration deadline.
    pub fn set_config_timeout(&mut self, timeout: Duration) {
        self.instance.settings.config_timeout_ms =
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    }

    /// Sets the suspicious-error threshold.
    pub fn set_threshold(&mut self, threshold: u32) {
        self.instance.settings.weird_things_threshold = threshold;
    }

    pub fn initial(&mut self) {
        self.last_result = Some(self.bootstrap.initial(&self.instance));
    }

    pub fn refresh(&mut self) {
        self.last_result = Some(self.bootstrap.refresh());
    }

    pub fn record_error(&mut self) {
        self.last_result = Some(self.bootstrap.record_error(&self.instance));
    }

    pub fn destroy(&mut self) {
        self.bootstrap.destroy();
    }

    /// Publishes a new configuration and notifies every subscribed listener.
    pub fn publish_config(&mut self) -> ConfigHandle {
        self.next_revision += 1;
        let config = ConfigHandle::new(
            ClusterConfig::new("default", self.next_revision, ConfigSource::Cccp)
                .with_nodes(["10.0.0.1:11210", "10.0.0.2:11210"]),
        );
        self.monitor.set_best_config(Some(config.clone()));

        self.monitor.set_notifying(true);
        for listener in self.monitor.listeners() {
            self.bootstrap
                .on_config_ready(&mut self.instance, listener, config.clone());
        }
        self.monitor.set_notifying(false);
        config
    }

    /// Advances virtual time and dispatches every timer that became due.
    pub fn advance(&mut self, by: Duration) {
        self.reactor.advance(by);
        self.drain();
    }

    /// Dispatches due timers without moving time.
    pub fn drain(&mut self) {
        while let Some(id) = self.reactor.pop_due() {
            self.bootstrap.on_timer(&mut self.instance, id);
        }
    }

    #[must_use]
    pub fn bootstrap(&self) -> &Bootstrap<RecordingMonitor, ManualReactor> {
        &self.bootstrap
    }

    #[must_use]
    pub fn state(&self) -> BootstrapState {
        self.bootstrap.state()
    }

    #[must_use]
    pub fn last_result(&self) -> Option<&Result<(), BootstrapError>> {
        self.last_result.as_ref()
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
