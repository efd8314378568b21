//! Structured reporting for bootstrap lifecycle events.

use std::sync::Arc;

use crate::bootstrap::{BootstrapError, ListenerMode};
use crate::status::ErrorCode;
use crate::topology::ConfigHandle;

/// Observer trait used to surface coordinator events to telemetry sinks.
pub trait BootstrapReporter: Send + Sync {
    /// A fetch cycle started in the given mode.
    fn bootstrap_started(&self, mode: ListenerMode);

    /// A request arrived while a cycle was already in flight.
    fn bootstrap_coalesced(&self, mode: ListenerMode);

    /// A request failed before the fetch cycle started.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// A refresh notification was deferred to the next loop turn.
    fn refresh_deferred(&self);

    /// A configuration was applied to the instance.
    fn configuration_applied(&self, config: &ConfigHandle);

    /// The initial deadline elapsed before a configuration arrived.
    fn deadline_elapsed(&self, error: ErrorCode);

    /// Enough suspicious errors were seen to force a refresh.
    fn error_threshold_reached(&self, threshold: u32);

    /// The capsule was released and its listener removed.
    fn capsule_destroyed(&self);
}

impl<T> BootstrapReporter for Arc<T>
where
    T: BootstrapReporter,
{
    fn bootstrap_started(&self, mode: ListenerMode) {
        (**self).bootstrap_started(mode);
    }

    fn bootstrap_coalesced(&self, mode: ListenerMode) {
        (**self).bootstrap_coalesced(mode);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn refresh_deferred(&self) {
        (**self).refresh_deferred();
    }

    fn configuration_applied(&self, config: &ConfigHandle) {
        (**self).configuration_applied(config);
    }

    fn deadline_elapsed(&self, error: ErrorCode) {
        (**self).deadline_elapsed(error);
    }

    fn error_threshold_reached(&self, threshold: u32) {
        (**self).error_threshold_reached(threshold);
    }

    fn capsule_destroyed(&self) {
        (**self).capsule_destroyed();
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredBootstrapReporter;

impl StructuredBootstrapReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl BootstrapReporter for StructuredBootstrapReporter {
    fn bootstrap_started(&self, mode: ListenerMode) {
        tracing::info!(
            target: "kvboot::bootstrap",
            event = "bootstrap_started",
            mode = %mode,
            "starting configuration fetch"
        );
    }

    fn bootstrap_coalesced(&self, mode: ListenerMode) {
        tracing::debug!(
            target: "kvboot::bootstrap",
            event = "bootstrap_coalesced",
            mode = %mode,
            "configuration fetch already in flight"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: "kvboot::bootstrap",
            event = "bootstrap_failed",
            error = %error,
            "could not start configuration fetch"
        );
    }

    fn refresh_deferred(&self) {
        tracing::info!(
            target: "kvboot::bootstrap",
            event = "refresh_deferred",
            "got async step callback"
        );
    }

    fn configuration_applied(&self, config: &ConfigHandle) {
        tracing::debug!(
            target: "kvboot::bootstrap",
            event = "configuration_applied",
            bucket = config.bucket(),
            revision = config.revision(),
            source = %config.source(),
            nodes = config.nodes().len(),
            "instance configured"
        );
    }

    fn deadline_elapsed(&self, error: ErrorCode) {
        tracing::warn!(
            target: "kvboot::bootstrap",
            event = "deadline_elapsed",
            error = %error,
            "failed to bootstrap in time"
        );
    }

    fn error_threshold_reached(&self, threshold: u32) {
        tracing::info!(
            target: "kvboot::bootstrap",
            event = "error_threshold_reached",
            threshold,
            "too many transport errors; refreshing configuration"
        );
    }

    fn capsule_destroyed(&self) {
        tracing::debug!(
            target: "kvboot::bootstrap",
            event = "capsule_destroyed",
            "bootstrap state released"
        );
    }
}
