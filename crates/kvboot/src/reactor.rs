//! Deterministic single-threaded reactor driven by virtual time.
//!
//! [`ManualReactor`] implements [`Timer`] without touching the wall clock. The
//! owning loop moves time forward with [`ManualReactor::advance`] and then
//! drains due callbacks one at a time with [`ManualReactor::pop_due`], so a
//! callback cancelled by an earlier dispatch in the same turn never fires.
//! Zero-delay callbacks are due immediately but are only ever handed out by
//! `pop_due`, never from inside [`Timer::schedule_immediate`].

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Duration;

use crate::timer::{Timer, TimerError, TimerId};

/// Counters describing everything the reactor has been asked to do.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReactorStats {
    /// Timers accepted by `schedule_after` or `schedule_immediate`.
    pub scheduled: usize,
    /// Pending timers removed by `cancel`.
    pub cancelled: usize,
    /// Timers handed out by `pop_due`.
    pub fired: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    due: Duration,
    id: TimerId,
}

#[derive(Debug, Default)]
struct ReactorState {
    now: Duration,
    next_id: u64,
    pending: BTreeSet<Entry>,
    capacity: Option<usize>,
    stats: ReactorStats,
}

impl ReactorState {
    fn insert(&mut self, delay: Duration) -> TimerId {
        self.next_id = self.next_id.saturating_add(1);
        let id = TimerId::new(self.next_id);
        let due = self.now.saturating_add(delay);
        self.pending.insert(Entry { due, id });
        self.stats.scheduled = self.stats.scheduled.saturating_add(1);
        id
    }
}

/// Virtual-time reactor handle. Clones share the same timer queue.
#[derive(Debug, Clone, Default)]
pub struct ManualReactor {
    state: Rc<RefCell<ReactorState>>,
}

impl ManualReactor {
    /// Builds a reactor at virtual time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a reactor that refuses `schedule_after` once `capacity` timers
    /// are pending.
    #[must_use]
    pub fn with_capacity_limit(capacity: usize) -> Self {
        let reactor = Self::new();
        reactor.state.borrow_mut().capacity = Some(capacity);
        reactor
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Moves virtual time forward. Due timers are collected with
    /// [`Self::pop_due`].
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.borrow_mut();
        state.now = state.now.saturating_add(by);
    }

    /// Removes and returns the earliest timer that is due, if any.
    ///
    /// Timers sharing a deadline fire in scheduling order.
    pub fn pop_due(&self) -> Option<TimerId> {
        let mut state = self.state.borrow_mut();
        let now = state.now;
        let entry = state.pending.first().copied().filter(|entry| entry.due <= now)?;
        state.pending.remove(&entry);
        state.stats.fired = state.stats.fired.saturating_add(1);
        Some(entry.id)
    }

    /// Deadline of the earliest pending timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.state.borrow().pending.first().map(|entry| entry.due)
    }

    /// Number of timers waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Returns `true` while `id` is scheduled and has not fired.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.state
            .borrow()
            .pending
            .iter()
            .any(|entry| entry.id == id)
    }

    /// Snapshot of the reactor counters.
    #[must_use]
    pub fn stats(&self) -> ReactorStats {
        self.state.borrow().stats
    }
}

impl Timer for ManualReactor {
    fn schedule_after(&self, delay: Duration) -> Result<TimerId, TimerError> {
        let mut state = self.state.borrow_mut();
        if let Some(capacity) = state.capacity
            && state.pending.len() >= capacity
        {
            return Err(TimerError::Exhausted { capacity });
        }
        Ok(state.insert(delay))
    }

    fn schedule_immediate(&self) -> TimerId {
        self.state.borrow_mut().insert(Duration::ZERO)
    }

    fn cancel(&self, id: TimerId) {
        let mut state = self.state.borrow_mut();
        let before = state.pending.len();
        state.pending.retain(|entry| entry.id != id);
        if state.pending.len() < before {
            state.stats.cancelled = state.stats.cancelled.saturating_add(1);
        }
    }
}
