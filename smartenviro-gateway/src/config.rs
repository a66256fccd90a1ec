//! Gateway configuration
//!
//! Loaded from a JSON file whose every field is optional; anything left out
//! takes the stock SmartEnviro value. A minimal file only needs the broker
//! endpoint:
//!
//! ```json
//! {
//!   "broker": { "endpoint": "abc123-ats.iot.eu-west-1.amazonaws.com" },
//!   "buffer_capacity": 250
//! }
//! ```
//!
//! Call [`GatewayConfig::validate`] before handing a config to the gateway;
//! the conversion helpers assume a validated config.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use smartenviro_connectors::{MqttConfig, RetryPolicy, TlsPaths};
use smartenviro_core::constants::broker::{
    DEFAULT_BROKER_PORT, DEFAULT_CERTIFICATE_PATH, DEFAULT_CLIENT_ID, DEFAULT_PRIVATE_KEY_PATH,
    DEFAULT_ROOT_CA_PATH, DEFAULT_TOPIC,
};
use smartenviro_core::constants::buffers::DEFAULT_BUFFER_CAPACITY;
use smartenviro_core::constants::device::{
    AIR_QUALITY_CHAR_UUID, DEFAULT_DEVICE_NAME, DEFAULT_SCAN_TIMEOUT_SECS, HUMIDITY_CHAR_UUID,
    LIGHT_LEVEL_CHAR_UUID, SERVICE_UUID, TEMPERATURE_CHAR_UUID,
};
use smartenviro_core::constants::timing::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_KEEP_ALIVE_SECS, DEFAULT_MAX_CONNECT_ATTEMPTS,
    DEFAULT_OPERATION_TIMEOUT_SECS, DEFAULT_PUBLISH_INTERVAL_SECS, DEFAULT_READ_INTERVAL_SECS,
    DEFAULT_RETRY_DELAY_SECS,
};

use crate::error::{ConfigError, GatewayError};

/// Sensor node identity and GATT layout
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// Advertised local name to scan for
    pub name: String,
    pub service_uuid: String,
    pub temperature_uuid: String,
    pub humidity_uuid: String,
    pub air_quality_uuid: String,
    pub light_level_uuid: String,
    /// Bound on finding and connecting to the node at startup
    pub scan_timeout_secs: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DEVICE_NAME.to_string(),
            service_uuid: SERVICE_UUID.to_string(),
            temperature_uuid: TEMPERATURE_CHAR_UUID.to_string(),
            humidity_uuid: HUMIDITY_CHAR_UUID.to_string(),
            air_quality_uuid: AIR_QUALITY_CHAR_UUID.to_string(),
            light_level_uuid: LIGHT_LEVEL_CHAR_UUID.to_string(),
            scan_timeout_secs: DEFAULT_SCAN_TIMEOUT_SECS,
        }
    }
}

impl DeviceConfig {
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }
}

/// Upstream broker settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
    pub endpoint: String,
    pub port: u16,
    pub client_id: String,
    /// Topic every sample is published to
    pub topic: String,
    pub keep_alive_secs: u64,
    /// Mutual TLS with the certificate paths below; plain TCP when false
    pub use_tls: bool,
    pub root_ca: PathBuf,
    pub certificate: PathBuf,
    pub private_key: PathBuf,
    pub connect_timeout_secs: u64,
    pub operation_timeout_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            endpoint: "localhost".to_string(),
            port: DEFAULT_BROKER_PORT,
            client_id: DEFAULT_CLIENT_ID.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
            use_tls: true,
            root_ca: PathBuf::from(DEFAULT_ROOT_CA_PATH),
            certificate: PathBuf::from(DEFAULT_CERTIFICATE_PATH),
            private_key: PathBuf::from(DEFAULT_PRIVATE_KEY_PATH),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
        }
    }
}

/// Complete gateway configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    pub device: DeviceConfig,
    pub broker: BrokerConfig,
    /// Offline backlog size in samples
    pub buffer_capacity: usize,
    pub publish_interval_secs: u64,
    pub read_interval_secs: u64,
    pub max_connect_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            broker: BrokerConfig::default(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            publish_interval_secs: DEFAULT_PUBLISH_INTERVAL_SECS,
            read_interval_secs: DEFAULT_READ_INTERVAL_SECS,
            max_connect_attempts: DEFAULT_MAX_CONNECT_ATTEMPTS,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

impl GatewayConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load `path`, or the defaults when none is given, and validate
    pub fn load(path: Option<&Path>) -> Result<Self, GatewayError> {
        let config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the gateway cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::invalid("buffer_capacity", "must be at least 1"));
        }
        if self.publish_interval_secs == 0 {
            return Err(ConfigError::invalid("publish_interval_secs", "must be non-zero"));
        }
        if self.read_interval_secs == 0 {
            return Err(ConfigError::invalid("read_interval_secs", "must be non-zero"));
        }
        if self.max_connect_attempts == 0 {
            return Err(ConfigError::invalid("max_connect_attempts", "must be at least 1"));
        }
        if self.device.scan_timeout_secs == 0 {
            return Err(ConfigError::invalid("device.scan_timeout_secs", "must be non-zero"));
        }
        if self.broker.endpoint.trim().is_empty() {
            return Err(ConfigError::invalid("broker.endpoint", "must not be empty"));
        }
        if self.broker.topic.trim().is_empty() {
            return Err(ConfigError::invalid("broker.topic", "must not be empty"));
        }
        if self.broker.client_id.is_empty() {
            return Err(ConfigError::invalid("broker.client_id", "must not be empty"));
        }
        if self.broker.connect_timeout_secs == 0 || self.broker.operation_timeout_secs == 0 {
            return Err(ConfigError::invalid("broker timeouts", "must be non-zero"));
        }
        Ok(())
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>, port: u16) -> Self {
        self.broker.endpoint = endpoint.into();
        self.broker.port = port;
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.broker.topic = topic.into();
        self
    }

    pub fn with_tls(mut self, enabled: bool) -> Self {
        self.broker.use_tls = enabled;
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn with_publish_interval(mut self, secs: u64) -> Self {
        self.publish_interval_secs = secs;
        self
    }

    pub fn with_read_interval(mut self, secs: u64) -> Self {
        self.read_interval_secs = secs;
        self
    }

    pub fn with_max_connect_attempts(mut self, attempts: u32) -> Self {
        self.max_connect_attempts = attempts;
        self
    }

    pub fn with_retry_delay(mut self, secs: u64) -> Self {
        self.retry_delay_secs = secs;
        self
    }

    pub fn with_scan_timeout(mut self, secs: u64) -> Self {
        self.device.scan_timeout_secs = secs;
        self
    }

    /// Backlog capacity; zero is clamped to one
    pub fn buffer_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.buffer_capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn read_interval(&self) -> Duration {
        Duration::from_secs(self.read_interval_secs)
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_secs(self.publish_interval_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .max_attempts(self.max_connect_attempts)
            .retry_delay(Duration::from_secs(self.retry_delay_secs))
            .connect_timeout(Duration::from_secs(self.broker.connect_timeout_secs))
            .operation_timeout(Duration::from_secs(self.broker.operation_timeout_secs))
    }

    pub fn mqtt_config(&self) -> MqttConfig {
        let broker = &self.broker;
        let config = MqttConfig::new(broker.endpoint.clone(), broker.port)
            .client_id(broker.client_id.clone())
            .keep_alive_secs(broker.keep_alive_secs);

        if broker.use_tls {
            config.tls(TlsPaths {
                root_ca: broker.root_ca.clone(),
                certificate: broker.certificate.clone(),
                private_key: broker.private_key.clone(),
            })
        } else {
            config
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer_capacity().get(), 100);
        assert_eq!(config.publish_interval(), Duration::from_secs(5));
        assert_eq!(config.read_interval(), Duration::from_secs(1));
        assert_eq!(config.device.scan_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn retry_policy_follows_config() {
        let policy = GatewayConfig::default()
            .with_max_connect_attempts(7)
            .with_retry_delay(2)
            .retry_policy();
        assert_eq!(policy.max_attempts, 7);
        assert_eq!(policy.retry_delay, Duration::from_secs(2));
        assert_eq!(policy.connect_timeout, Duration::from_secs(10));
        assert_eq!(policy.operation_timeout, Duration::from_secs(5));
    }

    #[test]
    fn mqtt_config_carries_tls_paths() {
        let mqtt = GatewayConfig::default()
            .with_endpoint("broker.example", 8883)
            .mqtt_config();
        assert_eq!(mqtt.host, "broker.example");
        assert_eq!(mqtt.tls, Some(TlsPaths::default()));

        let plain = GatewayConfig::default().with_tls(false).mqtt_config();
        assert!(plain.tls.is_none());
    }

    #[test]
    fn zero_capacity_is_rejected_and_clamped() {
        let config = GatewayConfig::default().with_buffer_capacity(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "buffer_capacity", .. })
        ));
        assert_eq!(config.buffer_capacity().get(), 1);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = GatewayConfig::from_json_str(r#"{ "bufer_capacity": 5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
