//! One-shot timers for the playback loop.
//!
//! The player never sleeps; it asks a [`Scheduler`] to fire after a delay
//! and is handed the resulting [`TimerToken`] back through
//! [`Player::tick`](super::Player::tick). Hosts wire this to whatever timer
//! facility they have; [`ManualScheduler`] is a deterministic clock for
//! tests and offline rendering.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::time::Duration;

/// Identifies one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

/// Source of one-shot timers.
pub trait Scheduler {
    /// Arrange for `token` to be delivered after `delay`.
    fn schedule(&mut self, delay: Duration) -> TimerToken;

    /// Cancel a timer. Unknown or already-fired tokens are ignored.
    fn cancel(&mut self, token: TimerToken);
}

impl<S: Scheduler + ?Sized> Scheduler for &mut S {
    fn schedule(&mut self, delay: Duration) -> TimerToken {
        (**self).schedule(delay)
    }

    fn cancel(&mut self, token: TimerToken) {
        (**self).cancel(token)
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Box<S> {
    fn schedule(&mut self, delay: Duration) -> TimerToken {
        (**self).schedule(delay)
    }

    fn cancel(&mut self, token: TimerToken) {
        (**self).cancel(token)
    }
}

/// A virtual clock that fires timers only when advanced.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    pending: Vec<(Duration, TimerToken)>,
}

impl ManualScheduler {
    /// A clock at time zero with nothing scheduled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of timers waiting to fire.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Absolute deadline of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.iter().map(|&(at, _)| at).min()
    }

    /// Time left until the earliest pending timer fires.
    pub fn time_until_next(&self) -> Option<Duration> {
        self.next_deadline().map(|at| at.saturating_sub(self.now))
    }

    /// Move the clock forward by `by`, returning every timer that came due,
    /// earliest first.
    pub fn advance(&mut self, by: Duration) -> Vec<TimerToken> {
        self.now += by;
        let now = self.now;
        let mut due: Vec<(Duration, TimerToken)> = Vec::new();
        self.pending.retain(|&entry| {
            if entry.0 <= now {
                due.push(entry);
                false
            } else {
                true
            }
        });
        due.sort();
        due.into_iter().map(|(_, token)| token).collect()
    }

    /// Jump to the earliest deadline and fire that single timer.
    pub fn advance_to_next(&mut self) -> Option<TimerToken> {
        let (index, &(at, token)) = self
            .pending
            .iter()
            .enumerate()
            .min_by_key(|(_, entry)| **entry)?;
        self.pending.swap_remove(index);
        if at > self.now {
            self.now = at;
        }
        Some(token)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerToken {
        let token = TimerToken(self.next_id);
        self.next_id += 1;
        self.pending.push((self.now + delay, token));
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        self.pending.retain(|&(_, t)| t != token);
    }
}
