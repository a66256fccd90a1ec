//! Core data model for the SmartEnviro gateway
//!
//! Holds the pieces every other crate agrees on: the immutable sensor sample
//! and its wire encoding, the bounded offline buffer, and the clock used to
//! stamp readings.
//!
//! Key constraints:
//! - Buffer memory is bounded by configuration, never by outage length
//! - Samples are never mutated after construction
//! - Wire field order is a compatibility contract with the cloud consumer
//!
//! ```no_run
//! use smartenviro_core::{BoundedQueue, SensorSample, SensorSampleBuilder};
//! use chrono::Utc;
//!
//! let sample = SensorSampleBuilder::new("SmartEnviro-Gateway-01")
//!     .captured_at(Utc::now())
//!     .temperature(23.5)
//!     .humidity(45.0)
//!     .air_quality(42)
//!     .light_level(300)
//!     .build()
//!     .unwrap();
//!
//! let mut backlog: BoundedQueue<SensorSample> = BoundedQueue::default();
//! backlog.enqueue(sample);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

// Macros for optional logging
#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

pub mod constants;
pub mod decode;
pub mod errors;
pub mod queue;
pub mod sample;
pub mod time;

// Public API
pub use decode::CharacteristicValues;
pub use errors::{SampleError, SampleResult};
pub use queue::{BoundedQueue, QueueStats};
pub use sample::{SensorSample, SensorSampleBuilder};
pub use time::{FixedTime, TimeSource};

#[cfg(feature = "std")]
pub use time::SystemTime;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
