use super::worker::Worker;
use crate::clock::Deadline;
use crate::source::TimerSource;
use crossbeam::channel;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::mem;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Everything the workers coordinate through, under a single mutex.
pub(super) struct PoolState {
    /// The pool is accepting work. When this goes false every worker
    /// observes it and exits.
    pub(super) threaded: bool,

    /// `init` has run without a matching `shutdown`.
    pub(super) initialized: bool,

    /// Number of live workers, running or in cleanup.
    pub(super) thread_count: usize,

    /// Number of workers blocked in `wait_until`, or about to block.
    pub(super) waiter_count: usize,

    /// Some worker has elected itself to sleep until a concrete deadline.
    pub(super) has_timed_waiter: bool,

    /// The deadline the timed waiter is sleeping to. Only finite while
    /// `has_timed_waiter` is set.
    pub(super) timed_waiter_deadline: Deadline,

    /// Identifies the current elected waiter. A worker that becomes the
    /// timed waiter stores the post-increment value; a matching value
    /// after its wait means nothing displaced the election in between.
    /// Bumped by every election and every kick.
    pub(super) timed_waiter_generation: u64,

    /// An external kick is pending and must be consumed.
    pub(super) kicked: bool,

    /// Handles of workers that have exited and await joining.
    pub(super) completed: Vec<JoinHandle<()>>,

    /// Number of timed wakeups so far this session.
    pub(super) wakeups: u64,
}

/// The shared heart of the pool: one mutex, two condition variables, and
/// the timer source all workers drive.
pub(super) struct Pool {
    pub(super) source: Arc<dyn TimerSource>,
    pub(super) state: Mutex<PoolState>,

    /// Worker sleep/wake. Signalled on kick, signalled to promote a new
    /// timed waiter, broadcast on shutdown.
    pub(super) cv_wait: Condvar,

    /// Signalled when `thread_count` reaches zero.
    pub(super) cv_shutdown: Condvar,
}

impl Pool {
    pub(super) fn new(source: Arc<dyn TimerSource>) -> Self {
        Self {
            source,
            state: Mutex::new(PoolState {
                threaded: false,
                initialized: false,
                thread_count: 0,
                waiter_count: 0,
                has_timed_waiter: false,
                timed_waiter_deadline: Deadline::never(),
                timed_waiter_generation: 0,
                kicked: false,
                completed: Vec::new(),
                wakeups: 0,
            }),
            cv_wait: Condvar::new(),
            cv_shutdown: Condvar::new(),
        }
    }

    /// Transition to threaded and spawn the seed worker. The pool grows
    /// on demand from this one thread.
    pub(super) fn start_threads(pool: &Arc<Self>) {
        let mut state = pool.state.lock();

        if !state.threaded {
            state.threaded = true;

            Self::start_worker_and_unlock(pool, state);
        }
    }

    /// Stop accepting work, wake every worker, and block until the last
    /// one has exited and been joined.
    pub(super) fn stop_threads(&self) {
        let mut state = self.state.lock();

        debug!("stopping timer workers: threaded={}", state.threaded);

        if state.threaded {
            state.threaded = false;

            self.cv_wait.notify_all();

            loop {
                self.reap_completed(&mut state);

                if state.thread_count == 0 {
                    break;
                }

                debug!("{} timer workers still running", state.thread_count);

                self.cv_shutdown.wait(&mut state);
            }
        }

        // the next session starts its wakeup count from a clean slate
        state.wakeups = 0;
    }

    /// Invalidate whatever deadline the pool is currently sleeping to.
    ///
    /// Setting `kicked` and bumping the generation dethrones the elected
    /// timed waiter, so whichever worker wakes re-checks the source for a
    /// fresh deadline.
    pub(super) fn kick(&self) {
        let mut state = self.state.lock();

        state.kicked = true;
        state.has_timed_waiter = false;
        state.timed_waiter_deadline = Deadline::never();
        state.timed_waiter_generation += 1;

        self.cv_wait.notify_one();
    }

    /// Register a new worker and spawn it. The counts are bumped under
    /// the lock but the spawn itself happens with the lock released, so
    /// it never blocks the hot path.
    pub(super) fn start_worker_and_unlock(pool: &Arc<Self>, mut state: MutexGuard<'_, PoolState>) {
        assert!(state.threaded);

        state.waiter_count += 1;
        state.thread_count += 1;

        drop(state);

        debug!("spawning timer worker");

        let worker = Worker::new(pool.clone());
        let (handle_tx, handle_rx) = channel::bounded(1);

        let handle = thread::Builder::new()
            .name("cue-timer".to_string())
            .spawn(move || worker.run(handle_rx))
            .expect("cannot spawn timer worker");

        let _ = handle_tx.send(handle);
    }

    /// Called by a worker whose main loop has ended. Its own join handle
    /// arrives over the channel its spawner sent it on.
    pub(super) fn retire_current_worker(&self, handle_rx: channel::Receiver<JoinHandle<()>>) {
        // the spawner sends the handle right after `spawn` returns, so it
        // is already there (or arriving) by the time a worker retires
        let handle = handle_rx.recv().ok();

        let mut state = self.state.lock();

        state.waiter_count -= 1;
        state.thread_count -= 1;

        if state.thread_count == 0 {
            self.cv_shutdown.notify_one();
        }

        state.completed.extend(handle);

        drop(state);

        trace!("timer worker exited");
    }

    /// Splice out the completed handles and join them with the lock
    /// released, so joining never happens under the hot lock.
    pub(super) fn reap_completed(&self, state: &mut MutexGuard<'_, PoolState>) {
        if state.completed.is_empty() {
            return;
        }

        let to_reap = mem::replace(&mut state.completed, Vec::new());

        MutexGuard::unlocked(state, || {
            for handle in to_reap {
                if handle.join().is_err() {
                    warn!("timer worker panicked");
                }
            }
        });
    }

    pub(super) fn wakeups(&self) -> u64 {
        self.state.lock().wakeups
    }

    pub(super) fn live_threads(&self) -> usize {
        self.state.lock().thread_count
    }
}
