//! SmartEnviro store-and-forward gateway
//!
//! Pulls readings from a sensor node, publishes them to an MQTT broker and
//! keeps a bounded backlog while the broker is unreachable.
//!
//! ```text
//! SensorDevice ──▶ GatewayLoop ──▶ PublishCoordinator ──▶ BrokerConnection
//!                  (cadences)            │      ▲           (retry policy)
//!                                        ▼      │ drain
//!                                     BoundedQueue
//! ```
//!
//! - [`GatewayConfig`]: JSON configuration with defaults and validation
//! - [`GatewayContext`]: config, broker connection and backlog, owned together
//! - [`PublishCoordinator`]: publish-or-buffer decision and backlog replay
//! - [`GatewayLoop`]: read and publish cadences, reconnects, shutdown
//! - [`PublishEvent`]: every outcome on the publish path, for observers

pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod gateway;

pub use config::{BrokerConfig, DeviceConfig, GatewayConfig};
pub use coordinator::{DrainReport, GatewayContext, PublishCoordinator, SubmitOutcome};
pub use error::{ConfigError, GatewayError};
pub use events::{GatewayStats, LogObserver, PublishEvent, PublishObserver};
pub use gateway::GatewayLoop;
