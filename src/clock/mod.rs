//! Points on the monotonic clock that a worker may sleep until

use std::cmp::Ordering;
use std::time::{Duration, Instant};

/// A `Deadline` is either a concrete point on the monotonic clock or
/// `never`, meaning "sleep until signalled".
///
/// Deadlines are totally ordered with `never` greater than every finite
/// deadline, so "the nearest deadline wins" comparisons can be written
/// directly with `<`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// A deadline that never arrives.
    pub fn never() -> Self {
        Self(None)
    }

    /// A deadline at the given instant.
    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    /// A deadline the given duration from now.
    pub fn after(delay: Duration) -> Self {
        Self(Some(Instant::now() + delay))
    }

    /// The underlying instant, or `None` for `never`.
    pub fn instant(self) -> Option<Instant> {
        self.0
    }

    pub fn is_finite(self) -> bool {
        self.0.is_some()
    }
}

impl Ord for Deadline {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for Deadline {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_never_is_greatest() {
        let soon = Deadline::at(Instant::now());
        let later = Deadline::after(Duration::from_secs(3600));

        assert!(soon < later);
        assert!(later < Deadline::never());
        assert!(soon < Deadline::never());
        assert_eq!(Deadline::never(), Deadline::never());
        assert!(!(Deadline::never() < Deadline::never()));
    }

    #[test]
    fn test_finite_ordering() {
        let now = Instant::now();

        let a = Deadline::at(now);
        let b = Deadline::at(now + Duration::from_millis(1));

        assert!(a < b);
        assert!(a <= a);
        assert_eq!(a.instant(), Some(now));
        assert!(a.is_finite());
        assert!(!Deadline::never().is_finite());
    }
}
