use super::{dormant_fixture, fixture};
use crate::testkit::eventually;
use std::time::Duration;

#[test]
fn test_kick_is_consumed() {
    let (manager, timers) = fixture();

    manager.init();

    eventually(Duration::from_secs(5), || manager.threads_for_test() == 1);

    assert_eq!(timers.kicks_consumed(), 0);

    manager.kick();

    eventually(Duration::from_secs(5), || timers.kicks_consumed() >= 1);

    manager.shutdown();
}

#[test]
fn test_kick_outlives_dormancy() {
    let (manager, timers) = dormant_fixture();

    manager.init();

    // nobody is awake to consume this; the flag has to wait for a worker
    manager.kick();

    assert_eq!(manager.threads_for_test(), 0);
    assert_eq!(timers.kicks_consumed(), 0);

    manager.set_threading(true);

    eventually(Duration::from_secs(5), || timers.kicks_consumed() == 1);

    manager.shutdown();
}
