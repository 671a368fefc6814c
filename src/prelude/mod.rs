//! Common types necessary for most applications

pub use log::{debug, error, info, trace, warn};

pub use crate::cfg::TimerConfig;
pub use crate::clock::Deadline;
pub use crate::exec::Thunk;
pub use crate::manager::TimerManager;
pub use crate::source::{TimerCheck, TimerSource};
