use crate::exec::BoxedFn;

/// Runs a thunk when dropped.
///
/// The pool leans on this for its book-keeping: a worker's retirement and
/// its return to the waiter pool are deferred, so the counts stay
/// balanced even when a timer callback panics and unwinds the thread.
pub struct Deferred {
    thunk: Option<Box<dyn BoxedFn + 'static>>,
}

impl Deferred {
    pub fn new<F: FnOnce()>(f: F) -> Self
    where
        F: 'static,
    {
        Self {
            thunk: Some(Box::new(f)),
        }
    }
}

impl Drop for Deferred {
    fn drop(&mut self) {
        if let Some(thunk) = self.thunk.take() {
            thunk.apply();
        }
    }
}
