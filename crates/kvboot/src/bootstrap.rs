//! Bootstrap coordinator.
//!
//! [`Bootstrap`] decides *when* the configuration monitor fetches and *how*
//! the instance reacts to the three events that can follow: a configuration
//! notification, the initial deadline, and a burst of suspicious transport
//! errors.
//!
//! All coordinator state lives in a lazily created capsule that owns exactly
//! one monitor subscription and at most one timer. Both are held by guards,
//! so every path that leaves the capsule (including early error returns and
//! plain `drop`) cancels the timer before removing the listener.

use std::fmt;
use std::mem;
use std::sync::Arc;

use thiserror::Error;

use crate::health::BootstrapReporter;
use crate::instance::Instance;
use crate::monitor::{ConfigMonitor, ListenerId, SubscribeError, Subscription};
use crate::status::ErrorCode;
use crate::timer::{ArmedTimer, Timer, TimerError, TimerId};
use crate::topology::ConfigHandle;

/// Message passed to [`Instance::report_error`] when the deadline elapses.
pub const DEADLINE_MESSAGE: &str = "failed to bootstrap in time";

/// Errors returned synchronously by [`Bootstrap::initial`] and
/// [`Bootstrap::refresh`].
///
/// Failures of the fetch itself arrive later through
/// [`Instance::report_error`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    /// The bootstrap capsule could not be created because the monitor refused
    /// its listener.
    #[error("failed to allocate bootstrap state: {source}")]
    Allocation {
        /// Subscription failure reported by the monitor.
        #[source]
        source: SubscribeError,
    },
    /// The initial deadline timer could not be armed.
    #[error("failed to arm configuration deadline: {source}")]
    Timer {
        /// Failure reported by the timer subsystem.
        #[source]
        source: TimerError,
    },
}

/// Reaction selected for the next monitor notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerMode {
    /// Apply the delivered configuration immediately.
    Initial,
    /// Defer to the next loop turn and apply the best known configuration.
    Refresh,
}

impl fmt::Display for ListenerMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Initial => "initial",
            Self::Refresh => "refresh",
        };
        formatter.write_str(label)
    }
}

/// Observable coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapState {
    /// No fetch cycle in flight.
    Idle,
    /// Waiting for the first configuration with a deadline armed.
    AwaitingInitial,
    /// Waiting, without a deadline, for a topology-change notification.
    AwaitingRefresh,
    /// A refresh notification arrived; the apply runs on the next loop turn.
    DeferredApply,
}

enum Phase<T: Timer> {
    Idle,
    AwaitingInitial { deadline: ArmedTimer<T> },
    AwaitingRefresh,
    // `in_cycle` is false when the notification arrived after the cycle had
    // already finished.
    DeferredApply { apply: ArmedTimer<T>, in_cycle: bool },
}

impl<T: Timer> Phase<T> {
    fn state(&self) -> BootstrapState {
        match self {
            Self::Idle => BootstrapState::Idle,
            Self::AwaitingInitial { .. } => BootstrapState::AwaitingInitial,
            Self::AwaitingRefresh => BootstrapState::AwaitingRefresh,
            Self::DeferredApply { .. } => BootstrapState::DeferredApply,
        }
    }

    fn timer(&self) -> Option<TimerId> {
        match self {
            Self::AwaitingInitial { deadline } => Some(deadline.id()),
            Self::DeferredApply { apply, .. } => Some(apply.id()),
            Self::Idle | Self::AwaitingRefresh => None,
        }
    }
}

// Field order matters: the phase (and any timer it owns) drops before the
// subscription.
struct Capsule<M: ConfigMonitor, T: Timer> {
    phase: Phase<T>,
    mode: ListenerMode,
    subscription: Subscription<M>,
}

/// Per-instance bootstrap coordinator.
///
/// The coordinator owns handles to the monitor and the timer subsystem; the
/// instance is borrowed for each call. Events are routed in by the owning
/// loop through [`Bootstrap::on_config_ready`] and [`Bootstrap::on_timer`].
pub struct Bootstrap<M: ConfigMonitor, T: Timer> {
    monitor: M,
    timer: T,
    reporter: Arc<dyn BootstrapReporter>,
    capsule: Option<Capsule<M, T>>,
    weird_things: u32,
}

impl<M, T> Bootstrap<M, T>
where
    M: ConfigMonitor,
    T: Timer,
{
    /// Builds an idle coordinator. No listener is registered until the first
    /// call to [`Self::initial`] or [`Self::refresh`].
    pub fn new(monitor: M, timer: T, reporter: Arc<dyn BootstrapReporter>) -> Self {
        Self {
            monitor,
            timer,
            reporter,
            capsule: None,
            weird_things: 0,
        }
    }

    /// Current state of the coordinator.
    #[must_use]
    pub fn state(&self) -> BootstrapState {
        self.capsule
            .as_ref()
            .map_or(BootstrapState::Idle, |capsule| capsule.phase.state())
    }

    /// Returns `true` while a fetch cycle is in flight.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() != BootstrapState::Idle
    }

    /// Mode selected by the most recent bootstrap request.
    #[must_use]
    pub fn listener_mode(&self) -> Option<ListenerMode> {
        self.capsule.as_ref().map(|capsule| capsule.mode)
    }

    /// Listener registered with the monitor, if the capsule exists.
    #[must_use]
    pub fn listener(&self) -> Option<ListenerId> {
        self.capsule
            .as_ref()
            .map(|capsule| capsule.subscription.listener())
    }

    /// Timer currently owned by the capsule.
    #[must_use]
    pub fn pending_timer(&self) -> Option<TimerId> {
        self.capsule
            .as_ref()
            .and_then(|capsule| capsule.phase.timer())
    }

    /// Suspicious errors recorded since the last reset.
    #[must_use]
    pub const fn error_count(&self) -> u32 {
        self.weird_things
    }

    /// Starts the initial fetch and arms the configuration deadline.
    ///
    /// The monitor is always prepared, even when the call coalesces with a
    /// cycle already in flight. When the deadline cannot be armed the fetch
    /// is not started and a capsule created by this call is discarded.
    pub fn initial<I>(&mut self, instance: &I) -> Result<(), BootstrapError>
    where
        I: Instance + ?Sized,
        M: Clone,
        T: Clone,
    {
        self.monitor.prepare();
        if self.is_active() {
            self.reporter.bootstrap_coalesced(ListenerMode::Initial);
            return Ok(());
        }

        let (mut capsule, created) = self.take_or_subscribe(ListenerMode::Initial)?;
        let timeout = instance.settings().config_timeout();
        let deadline = match self.timer.schedule_after(timeout) {
            Ok(id) => ArmedTimer::new(self.timer.clone(), id),
            Err(source) => {
                if created {
                    drop(capsule);
                } else {
                    self.capsule = Some(capsule);
                }
                let error = BootstrapError::Timer { source };
                self.reporter.bootstrap_failed(&error);
                return Err(error);
            }
        };

        capsule.mode = ListenerMode::Initial;
        capsule.phase = Phase::AwaitingInitial { deadline };
        self.capsule = Some(capsule);
        self.reporter.bootstrap_started(ListenerMode::Initial);
        self.monitor.start();
        Ok(())
    }

    /// Starts a refresh cycle without a deadline.
    ///
    /// Calls made while a cycle is in flight succeed without side effects.
    pub fn refresh(&mut self) -> Result<(), BootstrapError>
    where
        M: Clone,
    {
        if self.is_active() {
            self.reporter.bootstrap_coalesced(ListenerMode::Refresh);
            return Ok(());
        }

        let (mut capsule, _) = self.take_or_subscribe(ListenerMode::Refresh)?;
        capsule.mode = ListenerMode::Refresh;
        capsule.phase = Phase::AwaitingRefresh;
        self.capsule = Some(capsule);
        self.reporter.bootstrap_started(ListenerMode::Refresh);
        self.monitor.start();
        Ok(())
    }

    /// Counts a suspicious transport error and refreshes once the configured
    /// threshold is reached.
    ///
    /// A threshold of zero disables the trigger.
    pub fn record_error<I>(&mut self, instance: &I) -> Result<(), BootstrapError>
    where
        I: Instance + ?Sized,
        M: Clone,
    {
        self.weird_things = self.weird_things.saturating_add(1);
        let threshold = instance.settings().weird_things_threshold();
        if threshold == 0 || self.weird_things < threshold {
            return Ok(());
        }

        self.weird_things = 0;
        self.reporter.error_threshold_reached(threshold);
        self.refresh()
    }

    /// Handles a configuration notification delivered to `listener`.
    ///
    /// The subscription outlives the cycle that created it, so notifications
    /// keep reaching the instance after the coordinator returns to idle. In
    /// initial mode the configuration is applied immediately. In refresh mode
    /// nothing is applied here: the apply is scheduled for the next loop turn
    /// so the monitor is never re-entered from its own notification.
    pub fn on_config_ready<I>(&mut self, instance: &mut I, listener: ListenerId, config: ConfigHandle)
    where
        I: Instance + ?Sized,
        T: Clone,
    {
        let Some(capsule) = self.capsule.as_mut() else {
            tracing::debug!(target: "kvboot::bootstrap", %listener, "notification without bootstrap state");
            return;
        };
        if capsule.subscription.listener() != listener {
            tracing::debug!(
                target: "kvboot::bootstrap",
                %listener,
                expected = %capsule.subscription.listener(),
                "ignoring notification for foreign listener"
            );
            return;
        }

        match mem::replace(&mut capsule.phase, Phase::Idle) {
            Phase::AwaitingInitial { deadline } => {
                drop(deadline);
                self.complete(instance, &config);
            }
            Phase::AwaitingRefresh => {
                capsule.phase = Phase::DeferredApply {
                    apply: ArmedTimer::new(self.timer.clone(), self.timer.schedule_immediate()),
                    in_cycle: true,
                };
                self.reporter.refresh_deferred();
            }
            deferred @ Phase::DeferredApply { .. } => {
                capsule.phase = deferred;
                tracing::debug!(target: "kvboot::bootstrap", "apply already scheduled");
            }
            Phase::Idle => match capsule.mode {
                ListenerMode::Initial => {
                    tracing::debug!(
                        target: "kvboot::bootstrap",
                        revision = config.revision(),
                        "applying configuration pushed after bootstrap"
                    );
                    self.complete(instance, &config);
                }
                ListenerMode::Refresh => {
                    capsule.phase = Phase::DeferredApply {
                        apply: ArmedTimer::new(self.timer.clone(), self.timer.schedule_immediate()),
                        in_cycle: false,
                    };
                    self.reporter.refresh_deferred();
                }
            },
        }
    }

    /// Handles a fired timer. Ids other than the capsule's live timer are
    /// stale and ignored.
    pub fn on_timer<I>(&mut self, instance: &mut I, id: TimerId)
    where
        I: Instance + ?Sized,
    {
        let Some(capsule) = self.capsule.as_mut() else {
            tracing::debug!(target: "kvboot::bootstrap", timer = %id, "timer without bootstrap state");
            return;
        };

        match mem::replace(&mut capsule.phase, Phase::Idle) {
            Phase::AwaitingInitial { deadline } if deadline.id() == id => {
                deadline.fired();
                self.deadline_elapsed(instance);
            }
            Phase::DeferredApply { apply, in_cycle } if apply.id() == id => {
                apply.fired();
                match self.monitor.best_known_config() {
                    Some(config) => self.complete(instance, &config),
                    None => {
                        if in_cycle {
                            capsule.phase = Phase::AwaitingRefresh;
                        }
                        tracing::warn!(
                            target: "kvboot::bootstrap",
                            "refresh notification without a configuration; waiting"
                        );
                    }
                }
            }
            other => {
                capsule.phase = other;
                tracing::debug!(target: "kvboot::bootstrap", timer = %id, "ignoring stale timer");
            }
        }
    }

    /// Releases the capsule: cancels any pending timer, then unsubscribes.
    ///
    /// Calling this when no capsule exists, or more than once, does nothing.
    pub fn destroy(&mut self) {
        if let Some(capsule) = self.capsule.take() {
            drop(capsule);
            self.reporter.capsule_destroyed();
        }
    }

    fn take_or_subscribe(
        &mut self,
        mode: ListenerMode,
    ) -> Result<(Capsule<M, T>, bool), BootstrapError>
    where
        M: Clone,
    {
        if let Some(capsule) = self.capsule.take() {
            return Ok((capsule, false));
        }

        match Subscription::new(self.monitor.clone()) {
            Ok(subscription) => Ok((
                Capsule {
                    phase: Phase::Idle,
                    mode,
                    subscription,
                },
                true,
            )),
            Err(source) => {
                let error = BootstrapError::Allocation { source };
                self.reporter.bootstrap_failed(&error);
                Err(error)
            }
        }
    }

    fn complete<I>(&mut self, instance: &mut I, config: &ConfigHandle)
    where
        I: Instance + ?Sized,
    {
        instance.set_last_error(ErrorCode::Success);
        instance.apply_topology(config);
        self.reporter.configuration_applied(config);
        instance.maybe_stop_loop();
    }

    fn deadline_elapsed<I>(&mut self, instance: &mut I)
    where
        I: Instance + ?Sized,
    {
        // A monitor that still claims success once the deadline has passed is
        // inconsistent; the timeout wins.
        let error = match self.monitor.last_error() {
            ErrorCode::Success => ErrorCode::TimedOut,
            other => other,
        };
        instance.set_last_error(error);
        instance.report_error(error, DEADLINE_MESSAGE);
        self.reporter.deadline_elapsed(error);
        instance.maybe_stop_loop();
    }
}

impl<M, T> fmt::Debug for Bootstrap<M, T>
where
    M: ConfigMonitor,
    T: Timer,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Bootstrap")
            .field("state", &self.state())
            .field("listener", &self.listener())
            .field("pending_timer", &self.pending_timer())
            .field("weird_things", &self.weird_things)
            .finish_non_exhaustive()
    }
}
