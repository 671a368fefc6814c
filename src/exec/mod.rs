//! Units of callback work
//!
//! When a timer fires, its callback travels to the worker that observed
//! the firing as a `Thunk`, and the worker runs the whole batch -- the
//! "flush" -- outside of the pool's lock.

pub trait BoxedFn {
    fn apply(self: Box<Self>);
}

impl<F: FnOnce()> BoxedFn for F {
    #[inline(always)]
    fn apply(self: Box<F>) {
        (*self)()
    }
}

pub type Thunk = Box<dyn BoxedFn + Send + 'static>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_apply() {
        let counter = Arc::new(AtomicUsize::new(0));

        let thunk: Thunk = {
            let counter = counter.clone();

            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        };

        thunk.apply();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
