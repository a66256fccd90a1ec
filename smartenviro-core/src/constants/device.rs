//! Sensor Node Identity
//!
//! GATT identifiers advertised by the SmartEnviro sensor node firmware. The
//! four characteristics live under a single custom service and differ only in
//! the last byte of their UUID.

/// Advertised local name of the sensor node.
pub const DEFAULT_DEVICE_NAME: &str = "SmartEnviro-Node-01";

/// Custom environmental service.
pub const SERVICE_UUID: &str = "4fafc201-1fb5-459e-8fcc-c5c9c331914b";

/// Temperature characteristic (f32, little-endian, °C).
pub const TEMPERATURE_CHAR_UUID: &str = "beb5483e-36e1-4688-b7f5-ea07361b26a8";

/// Humidity characteristic (f32, little-endian, % RH).
pub const HUMIDITY_CHAR_UUID: &str = "beb5483e-36e1-4688-b7f5-ea07361b26a9";

/// Air quality characteristic (u16, little-endian, index).
pub const AIR_QUALITY_CHAR_UUID: &str = "beb5483e-36e1-4688-b7f5-ea07361b26aa";

/// Light level characteristic (u16, little-endian, lux).
pub const LIGHT_LEVEL_CHAR_UUID: &str = "beb5483e-36e1-4688-b7f5-ea07361b26ab";

/// Scan window for locating the node (seconds).
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 10;
