//! Configuration

use std::{env, str};

#[derive(Clone, Debug)]
pub struct TimerConfig {
    /// Whether `init` immediately spawns the seed worker. If false, the
    /// pool stays dormant until `set_threading(true)`.
    pub start_threaded: bool,
}

impl TimerConfig {
    pub fn parse() -> Self {
        Self {
            start_threaded: config("CUE_START_THREADED", true),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            start_threaded: true,
        }
    }
}

/// A helper function for extracting configuration values
/// from the environment. This can slightly simplify
/// a similar pattern to the above in applications.
pub fn config<T: str::FromStr>(name: &str, default: T) -> T {
    match env::var(name).ok() {
        None => default,

        Some(v) => v.parse().ok().unwrap_or_else(|| {
            warn!("cannot parse {}, using default", name);

            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config() {
        assert_eq!(config("_NOT_SET", 10), 10);
    }

    #[test]
    fn test_defaults() {
        assert!(TimerConfig::default().start_threaded);
    }
}
