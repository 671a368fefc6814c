//! The timer manager: a pool of threads that drives a timer source
//!
//! One worker -- the *timed waiter* -- sleeps until the nearest deadline;
//! the rest sleep until signalled. When timers fire, the observing worker
//! runs their callbacks outside of the pool's lock, and the pool grows if
//! that worker was the last one available, so a slow callback never delays
//! the next deadline. The pool contracts only when threading is stopped.

mod pool;
mod worker;


use self::pool::Pool;
use crate::cfg::TimerConfig;
use crate::source::{TimerCheck, TimerSource};
use std::sync::Arc;
use std::time::Instant;

/// Owns the pool and exposes its lifecycle.
///
/// Managers are independent values: any number can coexist, each driving
/// its own source with its own threads.
///
/// ```
/// use cue::cfg::TimerConfig;
/// use cue::manager::TimerManager;
/// # use cue::clock::Deadline;
/// # use cue::source::{TimerCheck, TimerSource};
/// # use std::time::Instant;
/// # struct NoTimers;
/// # impl TimerSource for NoTimers {
/// #     fn check(&self, _: Instant) -> TimerCheck {
/// #         TimerCheck::CheckedAndEmpty(Deadline::never())
/// #     }
/// #     fn consume_kick(&self) {}
/// # }
///
/// let manager = TimerManager::new(TimerConfig::default(), NoTimers);
///
/// manager.init();
/// // ... schedule timers on the source, kicking the manager ...
/// manager.shutdown();
/// ```
pub struct TimerManager {
    pool: Arc<Pool>,
    start_threaded: bool,
}

impl TimerManager {
    /// Create a manager for the given source. No threads are spawned
    /// until [`init`](TimerManager::init) or
    /// [`set_threading`](TimerManager::set_threading).
    pub fn new<S: TimerSource>(config: TimerConfig, source: S) -> Self {
        Self {
            pool: Arc::new(Pool::new(Arc::new(source))),
            start_threaded: config.start_threaded,
        }
    }

    /// Start the manager. If configured to start threaded, the seed
    /// worker is spawned here.
    ///
    /// Calling `init` twice without a `shutdown` in between is a caller
    /// bug and panics.
    pub fn init(&self) {
        {
            let mut state = self.pool.state.lock();

            assert!(!state.initialized, "timer manager is already initialized");

            state.initialized = true;
        }

        if self.start_threaded {
            Pool::start_threads(&self.pool);
        }
    }

    /// Stop the pool, blocking until every worker has exited and been
    /// joined. The manager may be `init`ed again afterwards.
    pub fn shutdown(&self) {
        self.pool.stop_threads();

        self.pool.state.lock().initialized = false;
    }

    /// Start or stop the pool's threads. Starting an already threaded
    /// pool (or stopping a stopped one) is a no-op.
    pub fn set_threading(&self, enabled: bool) {
        if enabled {
            Pool::start_threads(&self.pool);
        } else {
            self.pool.stop_threads();
        }
    }

    /// Configure whether a subsequent [`init`](TimerManager::init) spawns
    /// the seed worker.
    pub fn set_start_threaded(&mut self, enabled: bool) {
        self.start_threaded = enabled;
    }

    /// Notify the pool that its cached next-deadline may be stale, e.g.
    /// because a timer with an earlier deadline was just added to the
    /// source. Whatever the pool is currently sleeping to is invalidated
    /// and some worker re-checks the source.
    pub fn kick(&self) {
        self.pool.kick();
    }

    /// A single synchronous check on the calling thread: fire whatever is
    /// due right now and run the callbacks inline. Useful for tests and
    /// for embedders that keep the pool dormant.
    pub fn tick(&self) {
        if let TimerCheck::Fired(batch) = self.pool.source.check(Instant::now()) {
            for thunk in batch {
                thunk.apply();
            }
        }
    }

    /// Number of timed wakeups since threading last started. Reset when
    /// the threads are stopped, so an observer reading across a restart
    /// sees the count start over from zero.
    pub fn wakeups_for_test(&self) -> u64 {
        self.pool.wakeups()
    }

    /// Number of live workers.
    pub fn threads_for_test(&self) -> usize {
        self.pool.live_threads()
    }
}

impl Drop for TimerManager {
    fn drop(&mut self) {
        self.pool.stop_threads();
    }
}
