use super::pool::Pool;
use crate::clock::Deadline;
use crate::exec::Thunk;
use crate::source::TimerCheck;
use crate::util::Deferred;
use crossbeam::channel::Receiver;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

/// A single pool thread. Its whole life is the main loop: ask the source
/// for due timers, then either flush the fired callbacks or sleep until
/// there is a reason to look again.
pub(super) struct Worker {
    pool: Arc<Pool>,
}

impl Worker {
    pub(super) fn new(pool: Arc<Pool>) -> Self {
        Self { pool }
    }

    pub(super) fn run(self, handle_rx: Receiver<JoinHandle<()>>) {
        // retirement runs on drop, so the books stay balanced even if a
        // callback panic unwinds this thread mid-flush
        let retire = {
            let pool = self.pool.clone();

            Deferred::new(move || pool.retire_current_worker(handle_rx))
        };

        self.main_loop();

        drop(retire);
    }

    fn main_loop(&self) {
        loop {
            let now = Instant::now();

            let next = match self.pool.source.check(now) {
                TimerCheck::Fired(batch) => {
                    self.run_some_timers(batch);

                    continue;
                }

                TimerCheck::CheckedAndEmpty(next) => next,

                TimerCheck::NotChecked => {
                    // another worker is checking right now; it will
                    // either fire and wake someone, or see empty timers
                    // and take a timed sleep itself. A second timed
                    // waiter here would only burn a wakeup, so sleep
                    // until signalled instead.
                    trace!("timers not checked: expect another thread to");

                    Deadline::never()
                }
            };

            if !self.wait_until(next) {
                return;
            }
        }
    }

    /// Execute a batch of fired callbacks, keeping the pool responsive
    /// while they run.
    ///
    /// This thread leaves the waiter pool for the duration of the flush.
    /// If it was the last waiter, a fresh worker is spawned first -- the
    /// pool only ever grows until the threads are stopped, and a large
    /// burst of simultaneously firing timers may briefly use a large
    /// number of threads.
    fn run_some_timers(&self, batch: Vec<Thunk>) {
        let pool = &self.pool;

        let mut state = pool.state.lock();

        state.waiter_count -= 1;

        if state.waiter_count == 0 && state.threaded {
            Pool::start_worker_and_unlock(pool, state);
        } else {
            // with nobody sleeping on a concrete deadline, promote an
            // untimed waiter so the next deadline is not missed while
            // this thread is busy
            if !state.has_timed_waiter {
                trace!("kick untimed waiter");

                pool.cv_wait.notify_one();
            }

            drop(state);
        }

        // rejoin the waiter pool on drop, panicking callbacks included
        let rejoin = {
            let pool = pool.clone();

            Deferred::new(move || {
                let mut state = pool.state.lock();

                pool.reap_completed(&mut state);

                state.waiter_count += 1;
            })
        };

        trace!("flushing {} fired timers", batch.len());

        for thunk in batch {
            thunk.apply();
        }

        drop(rejoin);
    }

    /// Sleep until `next`, or forever if another worker already sleeps on
    /// an earlier deadline. Returns false when the pool has stopped and
    /// this thread should exit.
    ///
    /// At most one worker sleeps on a finite deadline. Whoever holds the
    /// election is identified by the generation counter: electing
    /// yourself stores the bumped value locally, and a matching value on
    /// wake means the election was not taken over (by another worker or
    /// by a kick) in the meantime.
    fn wait_until(&self, next: Deadline) -> bool {
        let pool = &self.pool;

        let mut state = pool.state.lock();

        if !state.threaded {
            return false;
        }

        // a pending kick means `next` may already be stale, so skip the
        // sleep entirely and let the next loop iteration pull a fresh
        // deadline from the source
        if !state.kicked {
            // initialized to a value that cannot match the current
            // generation; only winning the election below changes that
            let mut my_generation = state.timed_waiter_generation.wrapping_sub(1);

            let mut next = next;

            if next.is_finite() {
                if !state.has_timed_waiter || next < state.timed_waiter_deadline {
                    state.timed_waiter_generation += 1;
                    my_generation = state.timed_waiter_generation;
                    state.has_timed_waiter = true;
                    state.timed_waiter_deadline = next;

                    if log_enabled!(log::Level::Trace) {
                        if let Some(instant) = next.instant() {
                            trace!(
                                "sleeping for {:?}",
                                instant.saturating_duration_since(Instant::now())
                            );
                        }
                    }
                } else {
                    // someone is already sleeping on an earlier (or
                    // equal) deadline; this thread sleeps until signalled
                    next = Deadline::never();
                }
            }

            match next.instant() {
                Some(instant) => {
                    pool.cv_wait.wait_until(&mut state, instant);
                }

                None => {
                    trace!("sleeping until kicked");

                    pool.cv_wait.wait(&mut state);
                }
            }

            trace!(
                "wait ended: was_timed={} kicked={}",
                my_generation == state.timed_waiter_generation,
                state.kicked
            );

            // if this was the timed waiter, count the wakeup and release
            // the election so the next check (on any worker) can elect a
            // fresh one
            if my_generation == state.timed_waiter_generation {
                state.wakeups += 1;
                state.has_timed_waiter = false;
                state.timed_waiter_deadline = Deadline::never();
            }
        }

        if state.kicked {
            pool.source.consume_kick();

            state.kicked = false;
        }

        true
    }
}
