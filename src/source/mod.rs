//! The contract between the pool and the timer heap it drives

use crate::clock::Deadline;
use crate::exec::Thunk;
use std::sync::Arc;
use std::time::Instant;

/// The outcome of a single timer check.
pub enum TimerCheck {
    /// At least one timer was due. The callbacks of every fired timer are
    /// returned and must be run by the calling thread, which the pool does
    /// outside of its lock.
    Fired(Vec<Thunk>),

    /// Nothing was due. Carries the deadline of the nearest scheduled
    /// timer, or [`Deadline::never`] when no timers are scheduled at all.
    CheckedAndEmpty(Deadline),

    /// Another thread is checking concurrently, so nothing is known about
    /// the next deadline. The pool treats this as "no deadline" -- the
    /// competing checker will either fire timers or become the timed
    /// waiter itself, and a second timed waiter would only burn a wakeup.
    NotChecked,
}

/// A source of timers for the pool to drive.
///
/// The pool never looks inside the timer heap; it only asks it to check
/// for due timers and reports back the callbacks to run. In the other
/// direction, the source is expected to call
/// [`TimerManager::kick`](crate::manager::TimerManager::kick) whenever a
/// timer is added whose deadline may be earlier than what the pool is
/// currently sleeping to.
pub trait TimerSource: Send + Sync + 'static {
    /// Fire everything that is due at `now` and describe what remains.
    fn check(&self, now: Instant) -> TimerCheck;

    /// Acknowledge a kick previously delivered to the pool.
    ///
    /// This is called by the worker that observes the kick, while the
    /// pool's internal lock is held: implementations must return promptly
    /// and must not call back into the manager.
    fn consume_kick(&self);
}

/// Sources are commonly shared between the manager and whatever schedules
/// timers on them, so an `Arc`'d source is a source.
impl<S: TimerSource> TimerSource for Arc<S> {
    fn check(&self, now: Instant) -> TimerCheck {
        (**self).check(now)
    }

    fn consume_kick(&self) {
        (**self).consume_kick()
    }
}
