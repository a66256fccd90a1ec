//! Buffer Sizes
//!
//! The offline backlog is the only buffer in the gateway whose size depends on
//! outage length, so it is the one that has to be capped.

/// Default number of samples kept while the broker is unreachable.
///
/// At the default 5 s publish cadence this covers a little over 8 minutes of
/// outage before the oldest readings start being evicted.
/// Each buffered sample costs well under 100 bytes, so the whole backlog
/// stays below 10 KB.
pub const DEFAULT_BUFFER_CAPACITY: usize = 100;

/// Relative humidity lower bound (% RH).
pub const HUMIDITY_MIN_PCT: f32 = 0.0;

/// Relative humidity upper bound (% RH).
pub const HUMIDITY_MAX_PCT: f32 = 100.0;

/// Decimal places kept for temperature and humidity on the wire.
pub const WIRE_DECIMAL_PLACES: i32 = 2;
