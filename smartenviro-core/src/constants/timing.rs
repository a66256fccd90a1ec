//! Timing Constants
//!
//! Cadence and retry timing for the gateway loop and the broker connection.

// ===== CADENCE =====

/// Interval between device reads (seconds).
///
/// 1 Hz is the node's own measurement rate; reading faster only returns
/// the same characteristic values.
pub const DEFAULT_READ_INTERVAL_SECS: u64 = 1;

/// Interval between publish attempts (seconds).
///
/// Only the most recent reading of each interval is published.
pub const DEFAULT_PUBLISH_INTERVAL_SECS: u64 = 5;

// ===== CONNECTION RETRY =====

/// Connect attempts before a connect call reports failure.
pub const DEFAULT_MAX_CONNECT_ATTEMPTS: u32 = 3;

/// Fixed delay between connect attempts (seconds).
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

// ===== TIMEOUTS =====

/// Upper bound for a single connect handshake (seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Upper bound for a single publish acknowledgement (seconds).
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 5;

/// MQTT keep-alive (seconds).
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 60;
