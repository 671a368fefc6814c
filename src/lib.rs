//! # Cue
//!
//! Cue is a timer-driving thread pool for [Rust](https://www.rust-lang.org/).
//! It sits between a timer heap and the operating system: it wakes exactly
//! when the nearest timer is due, runs the fired callbacks, and grows the
//! pool while callbacks are executing so that new deadlines are never
//! missed behind a slow callback.
//!
//! At any moment at most one worker sleeps with a concrete deadline (the
//! *timed waiter*); every other worker sleeps until signalled. The timer
//! heap is consumed through the [`source::TimerSource`] trait and notifies
//! the pool with a *kick* whenever an earlier deadline appears.

extern crate atty;
extern crate chrono;
extern crate crossbeam;
extern crate fern;
extern crate parking_lot;

#[macro_use]
extern crate log;

pub mod cfg;
pub mod clock;
pub mod exec;
pub mod manager;
pub mod prelude;
pub mod source;
pub mod util;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
