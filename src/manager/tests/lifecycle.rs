use super::{dormant_fixture, fixture};
use crate::testkit::eventually;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[test]
fn test_init_and_shutdown() {
    let (manager, _timers) = fixture();

    manager.init();

    eventually(Duration::from_secs(5), || manager.threads_for_test() == 1);

    manager.shutdown();

    assert_eq!(manager.threads_for_test(), 0);
    assert_eq!(manager.wakeups_for_test(), 0);
}

#[test]
fn test_init_does_not_spawn_when_dormant() {
    let (manager, timers) = dormant_fixture();

    manager.init();

    assert_eq!(manager.threads_for_test(), 0);

    // a dormant manager can still be driven synchronously

    let fired = Arc::new(AtomicBool::new(false));

    {
        let fired = fired.clone();

        timers.schedule(Duration::from_millis(0), move || {
            fired.store(true, Ordering::SeqCst);
        });
    }

    manager.tick();

    assert!(fired.load(Ordering::SeqCst));

    manager.shutdown();
}

#[test]
#[should_panic(expected = "already initialized")]
fn test_double_init_panics() {
    let (manager, _timers) = dormant_fixture();

    manager.init();
    manager.init();
}

#[test]
fn test_shutdown_under_pending_timer() {
    let (manager, timers) = fixture();

    manager.init();

    eventually(Duration::from_secs(5), || manager.threads_for_test() == 1);

    let fired = Arc::new(AtomicBool::new(false));

    {
        let fired = fired.clone();

        timers.schedule(Duration::from_secs(10), move || {
            fired.store(true, Ordering::SeqCst);
        });
    }

    manager.kick();

    // let the worker absorb the kick and go back to sleep on the
    // ten-second deadline before pulling the rug out
    std::thread::sleep(Duration::from_millis(100));

    let begin = Instant::now();

    manager.shutdown();

    // shutdown is a matter of signalling, not of waiting out the timer
    assert!(begin.elapsed() < Duration::from_secs(5));
    assert_eq!(manager.threads_for_test(), 0);
    assert!(!fired.load(Ordering::SeqCst));
    assert_eq!(timers.pending(), 1);
}

#[test]
fn test_shutdown_then_init_again() {
    let (manager, _timers) = fixture();

    manager.init();
    manager.shutdown();

    manager.init();

    eventually(Duration::from_secs(5), || manager.threads_for_test() == 1);

    manager.shutdown();

    assert_eq!(manager.threads_for_test(), 0);
}

#[test]
fn test_disable_then_enable() {
    let (manager, timers) = fixture();

    manager.init();

    eventually(Duration::from_secs(5), || manager.threads_for_test() == 1);

    manager.set_threading(false);

    assert_eq!(manager.threads_for_test(), 0);

    manager.set_threading(true);

    let fired = Arc::new(AtomicBool::new(false));

    {
        let fired = fired.clone();

        timers.schedule(Duration::from_millis(10), move || {
            fired.store(true, Ordering::SeqCst);
        });
    }

    manager.kick();

    eventually(Duration::from_secs(5), || fired.load(Ordering::SeqCst));

    manager.shutdown();
}
