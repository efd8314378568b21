//! Deadline timer interface consumed by the coordinator.
//!
//! Timers are identified by [`TimerId`] tokens. The owning event loop routes
//! every fired id back to [`crate::Bootstrap::on_timer`]; the coordinator
//! compares the id against the timer it currently owns, so a timer that was
//! cancelled or replaced can never touch its state.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use thiserror::Error;

/// Token identifying a scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Wraps a raw identifier allocated by a timer implementation.
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

impl fmt::Display for TimerId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "timer#{}", self.0)
    }
}

/// Errors surfaced when a timer cannot be armed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// The reactor has no room for another pending timer.
    #[error("timer capacity of {capacity} pending timers exhausted")]
    Exhausted {
        /// Maximum number of pending timers.
        capacity: usize,
    },
    /// The reactor is shutting down or otherwise refused the request.
    #[error("timer subsystem refused the request: {reason}")]
    Refused {
        /// Implementation-supplied explanation.
        reason: String,
    },
}

/// One-shot timer facility supplied by the event loop.
///
/// Implementations are handles: the coordinator clones them into the guards
/// that own individual timers, so cloning must be cheap and every clone must
/// refer to the same reactor.
pub trait Timer {
    /// Schedules a callback after `delay`.
    fn schedule_after(&self, delay: Duration) -> Result<TimerId, TimerError>;

    /// Schedules a callback for the next turn of the event loop.
    ///
    /// The callback must never be delivered from inside this call; it fires
    /// only once the caller's stack has unwound back to the loop.
    fn schedule_immediate(&self) -> TimerId;

    /// Cancels a scheduled callback. Unknown or already fired ids are ignored.
    fn cancel(&self, id: TimerId);
}

impl<T> Timer for Rc<T>
where
    T: Timer + ?Sized,
{
    fn schedule_after(&self, delay: Duration) -> Result<TimerId, TimerError> {
        (**self).schedule_after(delay)
    }

    fn schedule_immediate(&self) -> TimerId {
        (**self).schedule_immediate()
    }

    fn cancel(&self, id: TimerId) {
        (**self).cancel(id);
    }
}

/// Scoped ownership of a scheduled timer.
///
/// Dropping the guard cancels the timer unless it was consumed through
/// [`ArmedTimer::fired`].
pub(crate) struct ArmedTimer<T: Timer> {
    timer: T,
    id: TimerId,
    armed: bool,
}

impl<T: Timer> ArmedTimer<T> {
    pub(crate) const fn new(timer: T, id: TimerId) -> Self {
        Self {
            timer,
            id,
            armed: true,
        }
    }

    pub(crate) fn id(&self) -> TimerId {
        self.id
    }

    /// Releases a timer that has already fired without cancelling it.
    pub(crate) fn fired(mut self) {
        self.armed = false;
    }
}

impl<T: Timer> Drop for ArmedTimer<T> {
    fn drop(&mut self) {
        if self.armed {
            tracing::trace!(target: "kvboot::timer", timer = %self.id, "cancelling timer");
            self.timer.cancel(self.id);
        }
    }
}

impl<T: Timer> fmt::Debug for ArmedTimer<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ArmedTimer")
            .field("id", &self.id)
            .field("armed", &self.armed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactor::ManualReactor;

    #[test]
    fn dropping_an_armed_timer_cancels_it() {
        let reactor = ManualReactor::new();
        let id = reactor
            .schedule_after(Duration::from_secs(1))
            .expect("schedule timer");
        let guard = ArmedTimer::new(reactor.clone(), id);

        drop(guard);

        assert!(!reactor.is_pending(id));
        assert_eq!(reactor.stats().cancelled, 1);
    }

    #[test]
    fn fired_timers_are_released_without_cancelling() {
        let reactor = ManualReactor::new();
        let id = reactor.schedule_immediate();
        assert_eq!(reactor.pop_due(), Some(id));

        ArmedTimer::new(reactor.clone(), id).fired();

        assert_eq!(reactor.stats().cancelled, 0);
    }
}
