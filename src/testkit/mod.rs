use crate::clock::Deadline;
use crate::source::{TimerCheck, TimerSource};
use fern::colors::{Color, ColoredLevelConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Repeatedly evaluate the provided function upto
/// a specified limit, sleeping for 30ms between
/// executions.
///
/// If the function doesn't return true within the
/// limit, this panics and thus fails the test.
///
/// This is useful for testing asynchronous behavior
/// from different threads in a polling fashion.
pub fn eventually<F: FnMut() -> bool>(limit: Duration, mut f: F) {
    let start = Instant::now();

    while !f() {
        if start.elapsed() > limit {
            panic!("provided function hasn't returned true within {:?}", limit);
        }

        thread::sleep(Duration::from_millis(30));
    }
}

/// Install a stderr logger so test runs show the pool's decisions.
/// Safe to call from multiple tests; only the first installation wins.
pub fn setup_logger() -> Result<(), fern::InitError> {
    let mut colors = ColoredLevelConfig::new();
    colors.info = Color::Blue;
    let tty = atty::is(atty::Stream::Stderr);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            if tty {
                out.finish(format_args!(
                    "{} {} [{}] {}",
                    chrono::Local::now().to_rfc3339(),
                    colors.color(record.level()),
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!(
                    "{} {} [{}] {}",
                    chrono::Local::now().to_rfc3339(),
                    record.level(),
                    record.target(),
                    message
                ))
            }
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

struct Scheduled {
    deadline: Instant,
    thunk: crate::exec::Thunk,
}

/// A scriptable [`TimerSource`] for driving the manager in tests.
///
/// Timers are plain (deadline, callback) pairs behind a mutex; a check
/// fires everything due, and concurrent checks from two workers resolve
/// to [`TimerCheck::NotChecked`] for the loser, like a real timer heap
/// guarding its own state would.
pub struct ManualTimers {
    scheduled: Mutex<Vec<Scheduled>>,
    checking: AtomicBool,
    kicks_consumed: AtomicUsize,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self {
            scheduled: Mutex::new(Vec::new()),
            checking: AtomicBool::new(false),
            kicks_consumed: AtomicUsize::new(0),
        }
    }

    /// Schedule `f` to fire once `delay` has elapsed. Callers are
    /// expected to kick the manager afterwards, as a real source would
    /// when an earlier deadline appears.
    pub fn schedule<F>(&self, delay: Duration, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.scheduled.lock().push(Scheduled {
            deadline: Instant::now() + delay,
            thunk: Box::new(f),
        });
    }

    /// How many kicks the pool has consumed so far.
    pub fn kicks_consumed(&self) -> usize {
        self.kicks_consumed.load(Ordering::SeqCst)
    }

    /// How many timers have not fired yet.
    pub fn pending(&self) -> usize {
        self.scheduled.lock().len()
    }
}

impl Default for ManualTimers {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerSource for ManualTimers {
    fn check(&self, now: Instant) -> TimerCheck {
        if self.checking.swap(true, Ordering::SeqCst) {
            return TimerCheck::NotChecked;
        }

        let result = {
            let mut scheduled = self.scheduled.lock();

            let mut due = Vec::new();
            let mut i = 0;

            while i < scheduled.len() {
                if scheduled[i].deadline <= now {
                    due.push(scheduled.swap_remove(i).thunk);
                } else {
                    i += 1;
                }
            }

            if due.is_empty() {
                let next = scheduled
                    .iter()
                    .map(|s| Deadline::at(s.deadline))
                    .min()
                    .unwrap_or_else(Deadline::never);

                TimerCheck::CheckedAndEmpty(next)
            } else {
                TimerCheck::Fired(due)
            }
        };

        self.checking.store(false, Ordering::SeqCst);

        result
    }

    fn consume_kick(&self) {
        self.kicks_consumed.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fires_only_due_timers() {
        let timers = ManualTimers::new();

        let fired = Arc::new(AtomicUsize::new(0));

        for delay in &[0, 0, 3_600_000] {
            let fired = fired.clone();

            timers.schedule(Duration::from_millis(*delay), move || {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }

        match timers.check(Instant::now()) {
            TimerCheck::Fired(batch) => {
                for thunk in batch {
                    thunk.apply();
                }
            }

            _ => panic!("expected two due timers to fire"),
        }

        assert_eq!(fired.load(Ordering::SeqCst), 2);
        assert_eq!(timers.pending(), 1);

        match timers.check(Instant::now()) {
            TimerCheck::CheckedAndEmpty(next) => assert!(next.is_finite()),
            _ => panic!("expected an empty check with a deadline"),
        }
    }

    #[test]
    fn test_empty_check_has_no_deadline() {
        let timers = ManualTimers::new();

        match timers.check(Instant::now()) {
            TimerCheck::CheckedAndEmpty(next) => assert!(!next.is_finite()),
            _ => panic!("expected an empty check"),
        }
    }
}
