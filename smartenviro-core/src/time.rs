//! Time sources for stamping samples
//!
//! Provides clock abstraction so capture times can come from:
//! - The system wall clock (normal operation)
//! - A fixed or stepping clock (tests, simulation)
//!
//! Capture time is wall-clock UTC because it travels to the cloud consumer as
//! an ISO-8601 string. Cadence timing in the gateway loop uses the runtime's
//! monotonic clock instead and never reads this source.

use chrono::{DateTime, Duration, Utc};
use core::cell::Cell;

/// Capture timestamp (UTC wall clock)
pub type Timestamp = DateTime<Utc>;

/// Source of capture timestamps
pub trait TimeSource: Send {
    /// Current UTC time
    fn now(&self) -> Timestamp;

    /// Check if this source tracks real wall-clock time
    fn is_wall_clock(&self) -> bool;
}

/// System time source (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTime;

#[cfg(feature = "std")]
impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Fixed time source for testing
///
/// Optionally steps forward by a fixed amount every time it is read, which
/// gives each simulated sample a distinct, predictable capture time.
#[derive(Debug, Clone)]
pub struct FixedTime {
    current: Cell<Timestamp>,
    step: Duration,
}

impl FixedTime {
    /// Clock frozen at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            current: Cell::new(timestamp),
            step: Duration::zero(),
        }
    }

    /// Clock that advances by `step` after every read
    pub fn stepping(start: Timestamp, step: Duration) -> Self {
        Self {
            current: Cell::new(start),
            step,
        }
    }

    /// Jump to `timestamp`
    pub fn set(&mut self, timestamp: Timestamp) {
        self.current.set(timestamp);
    }

    /// Move forward by `by`
    pub fn advance(&mut self, by: Duration) {
        self.current.set(self.current.get() + by);
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        let now = self.current.get();
        self.current.set(now + self.step);
        now
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}
