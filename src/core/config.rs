//! # Pool configuration.
//!
//! Provides [`Config`] centralized settings for the pool runtime.
//!
//! ## Sentinel values
//! - `grace = 0s` → wait indefinitely for workers to stop (no forced path)
//! - `concurrency = 0` → no workers; `run` only waits for the shutdown trigger

use std::time::Duration;

/// Configuration for the worker pool.
///
/// ## Field semantics
/// - `concurrency`: number of workers, fixed for one `run` (`u8`, so at most 255)
/// - `grace`: maximum wait for workers to stop after shutdown (`0s` = unbounded)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
///
/// # Example
/// ```
/// use std::time::Duration;
/// use workvisor::Config;
///
/// let mut cfg = Config::default();
/// cfg.concurrency = 8;
/// assert_eq!(cfg.grace_limit(), None);
///
/// cfg.grace = Duration::from_secs(30);
/// assert_eq!(cfg.grace_limit(), Some(Duration::from_secs(30)));
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of concurrent workers sharing the subscription stream.
    pub concurrency: u8,

    /// Maximum time to wait for workers to finish after shutdown is requested.
    ///
    /// - `Duration::ZERO` = wait until every in-flight pipeline finishes
    /// - `> 0` = abort the remaining workers and return `RuntimeError::GraceExceeded`
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow listeners that lag behind more than `bus_capacity` events skip the
    /// oldest ones.
    pub bus_capacity: usize,
}

impl Config {
    /// Creates a default configuration with the given worker count.
    pub fn with_concurrency(concurrency: u8) -> Self {
        Self {
            concurrency,
            ..Self::default()
        }
    }

    /// Returns the shutdown grace as an `Option`.
    ///
    /// - `None` → unbounded wait
    /// - `Some(d)` → bounded wait
    #[inline]
    pub fn grace_limit(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `concurrency = 1`
    /// - `grace = 0s` (wait for in-flight work, however long it takes)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            concurrency: 1,
            grace: Duration::ZERO,
            bus_capacity: 1024,
        }
    }
}
