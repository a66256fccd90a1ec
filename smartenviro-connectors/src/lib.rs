//! Broker and Device Connectors for the SmartEnviro Gateway
//!
//! ## Overview
//!
//! The gateway sits between two links it does not control: a BLE sensor node
//! on one side and a cloud MQTT broker on the other. This crate wraps both
//! behind narrow capability traits so the publishing core can be driven by
//! real hardware in production and by scripted doubles in tests.
//!
//! ```text
//! ┌──────────────┐   read_sample   ┌──────────────┐   publish   ┌──────────────┐
//! │ SensorDevice │ ──────────────▶ │   gateway    │ ──────────▶ │ BrokerClient │
//! │  (BLE node)  │                 │     core     │             │    (MQTT)    │
//! └──────────────┘                 └──────────────┘             └──────────────┘
//!                                         │
//!                                         ▼
//!                                 BrokerConnection
//!                           (state machine + retry policy)
//! ```
//!
//! ## Connection Model
//!
//! [`BrokerClient`] is the raw transport: one connect handshake, one publish,
//! one disconnect, no retries and no state tracking. [`BrokerConnection`]
//! wraps a client and owns everything stateful:
//!
//! - The [`ConnectionState`] the coordinator observes
//! - Bounded connect retries with a fixed, interruptible delay
//! - Per-operation timeouts
//! - [`ConnectionStats`]
//!
//! ### Delivery Semantics
//!
//! Samples are published at QoS 1 (at-least-once). The broker acknowledges
//! each message; a lost acknowledgement can cause a duplicate, which the
//! cloud consumer tolerates.
//!
//! ### Failure Handling
//!
//! Any transport failure during publish drops the connection to
//! `Disconnected` so the caller stops publishing and starts buffering. The
//! connection never reconnects on its own; the gateway loop decides when to
//! call `connect()` again.
//!
//! ## Shutdown
//!
//! Every wait in this crate (connect handshakes, retry delays, and through
//! [`Shutdown::sleep`], the gateway's tick waits) races a [`Shutdown`] signal so a stop request is
//! honoured within one polling interval.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use smartenviro_connectors::{BrokerConnection, RetryPolicy, QoS};
//! use smartenviro_connectors::mqtt::{MqttClient, MqttConfig};
//!
//! # async fn example() -> Result<(), smartenviro_connectors::ConnectorError> {
//! let client = MqttClient::new(MqttConfig::new("broker.local", 1883).client_id("gw-01"));
//! let mut broker = BrokerConnection::new(client, RetryPolicy::default());
//!
//! broker.connect().await?;
//! broker.publish("smartenviro/sensors/data", br#"{"temperature":21.5}"#, QoS::AtLeastOnce).await?;
//! broker.disconnect().await;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod device;
pub mod shutdown;

#[cfg(feature = "mqtt")]
pub mod mqtt;

// Re-export common types
pub use connection::{BrokerConnection, RetryPolicy};
pub use device::{DeviceError, SensorDevice, SimulatedDevice};
pub use shutdown::{shutdown_channel, Shutdown, ShutdownHandle};

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttClient, MqttConfig, TlsPaths};

use core::fmt;
use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    #[error("Not connected")]
    NotConnected,

    /// Every connect attempt failed
    #[error("Connection failed after {attempts} attempt(s): {reason}")]
    ConnectionFailed { attempts: u32, reason: String },

    /// A single publish was rejected, timed out or lost its transport
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Timeout")]
    Timeout,

    /// Broker answered the handshake with a non-success code
    #[error("Connection refused: {0}")]
    Refused(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    /// A shutdown request interrupted the operation
    #[error("Cancelled by shutdown")]
    Cancelled,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Broker-side view of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// MQTT delivery guarantee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QoS {
    AtMostOnce,
    #[default]
    AtLeastOnce,
    ExactlyOnce,
}

/// Raw broker transport
///
/// Implementations perform exactly one handshake or one publish per call and
/// report failure through the returned error. Retries, timeouts and state
/// tracking belong to [`BrokerConnection`].
#[async_trait::async_trait]
pub trait BrokerClient: Send {
    /// Open a session with the broker
    async fn connect(&mut self) -> Result<(), ConnectorError>;

    /// Send one message and wait for the broker's acknowledgement
    async fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> Result<(), ConnectorError>;

    /// Close the session; must be safe to call when not connected
    async fn disconnect(&mut self);

    /// Human-readable endpoint for log lines
    fn endpoint(&self) -> String;
}

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Total messages acknowledged by the broker
    pub messages_sent: u64,
    /// Total publish attempts that failed
    pub messages_failed: u64,
    /// Total payload bytes acknowledged
    pub bytes_sent: u64,
    /// Number of successful connects
    pub reconnections: u32,
    /// Number of connect calls that exhausted every attempt
    pub connect_failures: u32,
    /// Last error message
    pub last_error: Option<String>,
}
