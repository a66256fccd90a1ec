//! Constants for the SmartEnviro Gateway
//!
//! Centralized defaults for the gateway. Every value here is the factory
//! setting of a field in the gateway configuration; deployments override them
//! through the config file rather than by editing this module.
//!
//! ## Organization
//!
//! Constants are grouped by domain:
//! - **Buffers**: Offline backlog sizing
//! - **Timing**: Read/publish cadence and connection retry timing
//! - **Device**: Sensor node identity and BLE characteristic UUIDs
//! - **Broker**: Cloud endpoint, topic and client identity

/// Offline backlog sizing.
pub mod buffers;

/// Read/publish cadence, retry and timeout values.
pub mod timing;

/// Sensor node name and GATT identifiers.
pub mod device;

/// Broker endpoint, credentials and topic defaults.
pub mod broker;

// Re-export commonly used constants for convenience
pub use buffers::DEFAULT_BUFFER_CAPACITY;

pub use timing::{
    DEFAULT_PUBLISH_INTERVAL_SECS, DEFAULT_READ_INTERVAL_SECS,
    DEFAULT_MAX_CONNECT_ATTEMPTS, DEFAULT_RETRY_DELAY_SECS,
};

pub use device::DEFAULT_DEVICE_NAME;

pub use broker::{DEFAULT_BROKER_PORT, DEFAULT_CLIENT_ID, DEFAULT_TOPIC};
