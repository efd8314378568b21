//! Configuration monitor interface consumed by the coordinator.

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::status::ErrorCode;
use crate::topology::ConfigHandle;

/// Token identifying a listener registered with the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Wraps a raw identifier allocated by a monitor implementation.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "listener#{}", self.0)
    }
}

/// Errors raised when the monitor cannot register another listener.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscribeError {
    /// The listener table is full.
    #[error("listener table is full ({capacity} listeners)")]
    ListenerTableFull {
        /// Maximum number of listeners the monitor accepts.
        capacity: usize,
    },
    /// The monitor has been shut down.
    #[error("configuration monitor is closed")]
    Closed,
}

/// Eventually consistent source of cluster configuration.
///
/// The monitor notifies listeners by having the owning event loop call
/// [`crate::Bootstrap::on_config_ready`] with the subscribed [`ListenerId`].
/// Like [`crate::Timer`], implementations are cheap cloneable handles.
pub trait ConfigMonitor {
    /// Resets provider state ahead of a fresh fetch cycle.
    fn prepare(&self);

    /// Starts (or continues) fetching configuration from the cluster.
    fn start(&self);

    /// Registers a listener for configuration notifications.
    fn subscribe(&self) -> Result<ListenerId, SubscribeError>;

    /// Removes a listener. Unknown ids are ignored.
    fn unsubscribe(&self, listener: ListenerId);

    /// Most recent error recorded by the fetch cycle.
    fn last_error(&self) -> ErrorCode;

    /// Best configuration currently known, if any has been received.
    fn best_known_config(&self) -> Option<ConfigHandle>;
}

impl<T> ConfigMonitor for Rc<T>
where
    T: ConfigMonitor + ?Sized,
{
    fn prepare(&self) {
        (**self).prepare();
    }

    fn start(&self) {
        (**self).start();
    }

    fn subscribe(&self) -> Result<ListenerId, SubscribeError> {
        (**self).subscribe()
    }

    fn unsubscribe(&self, listener: ListenerId) {
        (**self).unsubscribe(listener);
    }

    fn last_error(&self) -> ErrorCode {
        (**self).last_error()
    }

    fn best_known_config(&self) -> Option<ConfigHandle> {
        (**self).best_known_config()
    }
}

/// Scoped ownership of a monitor subscription; dropping it unsubscribes.
pub(crate) struct Subscription<M: ConfigMonitor> {
    monitor: M,
    listener: ListenerId,
}

impl<M: ConfigMonitor> Subscription<M> {
    pub(crate) fn new(monitor: M) -> Result<Self, SubscribeError> {
        let listener = monitor.subscribe()?;
        Ok(Self { monitor, listener })
    }

    pub(crate) const fn listener(&self) -> ListenerId {
        self.listener
    }
}

impl<M: ConfigMonitor> Drop for Subscription<M> {
    fn drop(&mut self) {
        tracing::trace!(
            target: "kvboot::monitor",
            listener = %self.listener,
            "removing configuration listener"
        );
        self.monitor.unsubscribe(self.listener);
    }
}

impl<M: ConfigMonitor> fmt::Debug for Subscription<M> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Subscription")
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}
