//! Broker Defaults
//!
//! The gateway publishes to an MQTT broker over TLS with client certificates.
//! The endpoint is deployment-specific and has no meaningful default.

/// MQTT over TLS.
pub const DEFAULT_BROKER_PORT: u16 = 8883;

/// Client identifier presented at CONNECT.
pub const DEFAULT_CLIENT_ID: &str = "SmartEnviro-Gateway-01";

/// Topic every sample is published to.
pub const DEFAULT_TOPIC: &str = "smartenviro/sensors/data";

/// Root CA bundle path, relative to the working directory.
pub const DEFAULT_ROOT_CA_PATH: &str = "./certs/root-CA.pem";

/// Client certificate path.
pub const DEFAULT_CERTIFICATE_PATH: &str = "./certs/certificate.pem.crt";

/// Client private key path.
pub const DEFAULT_PRIVATE_KEY_PATH: &str = "./certs/private.pem.key";

/// Capacity of the client's internal request channel.
pub const DEFAULT_REQUEST_CHANNEL_CAPACITY: usize = 10;
