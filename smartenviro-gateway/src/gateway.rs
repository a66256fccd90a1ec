//! Gateway Main Loop
//!
//! ## Cadences
//!
//! The loop runs on two clocks. Every `read_interval` it pulls one sample
//! from the device and keeps it as the latest reading, replacing whatever was
//! held before. Once `publish_interval` has passed since the last publish, the
//! latest reading is submitted and the backlog drained:
//!
//! ```text
//! read      ●   ●   ●   ●   ●   ●   ●   ●   ●   ●   ●
//! t(s)      0   1   2   3   4   5   6   7   8   9   10
//! publish                       ▲                   ▲
//!                          sample@5            sample@10
//! ```
//!
//! Readings in between are superseded, not queued. Ticks are measured on the
//! runtime's monotonic clock, so tests drive the loop with tokio's paused
//! clock.
//!
//! ## Reconnection
//!
//! A publish tick that finds the broker down first runs a full `connect()`
//! with the configured retry policy. On success the backlog is replayed
//! before the fresh sample goes out, which keeps the broker-side order equal
//! to the read order.
//!
//! ## Shutdown
//!
//! Every wait races the [`Shutdown`] signal, so a stop request ends the loop
//! within one read interval. Buffered samples are not flushed on the way out;
//! the device and the broker are always released.

use log::{debug, info, warn};
use smartenviro_connectors::{BrokerClient, DeviceError, SensorDevice, Shutdown};
use smartenviro_core::SensorSample;
use tokio::time::{timeout, Instant};

use crate::coordinator::{GatewayContext, PublishCoordinator};
use crate::error::GatewayError;
use crate::events::{GatewayStats, PublishEvent, PublishObserver};

/// Periodic driver between a sensor device and the publish coordinator
pub struct GatewayLoop<C: BrokerClient, D: SensorDevice> {
    coordinator: PublishCoordinator<C>,
    device: D,
    shutdown: Shutdown,
    latest: Option<SensorSample>,
}

impl<C: BrokerClient, D: SensorDevice> GatewayLoop<C, D> {
    pub fn new(context: GatewayContext<C>, device: D, shutdown: Shutdown) -> Self {
        Self {
            coordinator: PublishCoordinator::new(context).with_shutdown(shutdown.clone()),
            device,
            shutdown,
            latest: None,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn PublishObserver>) -> Self {
        self.coordinator = self.coordinator.with_observer(observer);
        self
    }

    pub fn coordinator(&self) -> &PublishCoordinator<C> {
        &self.coordinator
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Run until shutdown is requested
    ///
    /// A broker that is down at startup is not fatal; samples buffer until it
    /// comes back. A device that cannot be reached within the scan timeout
    /// is, and the device and broker are released before the error is
    /// returned.
    pub async fn run(&mut self) -> Result<GatewayStats, GatewayError> {
        info!("SmartEnviro gateway starting");

        if !self.coordinator.connect().await {
            warn!("Broker unavailable at startup, buffering until it returns");
        }

        if self.shutdown.is_requested() {
            self.release().await;
            return Ok(self.coordinator.stats().clone());
        }

        let (name, scan_timeout) = {
            let device = &self.coordinator.context().config.device;
            (device.name.clone(), device.scan_timeout())
        };
        let found = tokio::select! {
            found = timeout(scan_timeout, self.device.scan_and_connect()) => {
                found.unwrap_or_else(|_| {
                    warn!("No response from {} within {:?}", name, scan_timeout);
                    false
                })
            }
            () = self.shutdown.requested() => {
                self.release().await;
                return Ok(self.coordinator.stats().clone());
            }
        };
        if !found {
            self.device.disconnect().await;
            self.coordinator.disconnect().await;
            return Err(GatewayError::DeviceUnavailable(name));
        }

        let (read_interval, publish_interval) = {
            let config = &self.coordinator.context().config;
            (config.read_interval(), config.publish_interval())
        };
        info!(
            "Gateway running: read every {:?}, publish every {:?}",
            read_interval, publish_interval
        );

        let mut last_publish = Instant::now();
        while !self.shutdown.is_requested() {
            self.read_tick().await;

            if self.latest.is_some() && last_publish.elapsed() >= publish_interval {
                self.publish_tick().await;
                last_publish = Instant::now();
            }

            if !self.shutdown.sleep(read_interval).await {
                break;
            }
        }

        self.release().await;
        Ok(self.coordinator.stats().clone())
    }

    async fn read_tick(&mut self) {
        match self.device.read_sample().await {
            Ok(Some(sample)) => {
                if let Some(superseded) = self.latest.replace(sample) {
                    debug!("Superseded reading: {}", superseded);
                }
            }
            Ok(None) => debug!("No reading this tick"),
            Err(DeviceError::Malformed(error)) => {
                self.coordinator.report(PublishEvent::Dropped { error })
            }
            Err(e) => warn!("Sensor read failed: {}", e),
        }
    }

    async fn publish_tick(&mut self) {
        let Some(sample) = self.latest.take() else {
            return;
        };

        if !self.coordinator.is_connected() && self.coordinator.connect().await {
            self.coordinator.drain().await;
        }

        info!("Submitting {}", sample);
        self.coordinator.submit(sample).await;
        self.coordinator.drain().await;
    }

    async fn release(&mut self) {
        info!("Stopping gateway");
        self.device.disconnect().await;
        self.coordinator.disconnect().await;

        let backlog = self.coordinator.queue().len();
        if backlog > 0 {
            warn!("{} buffered sample(s) discarded on shutdown", backlog);
        }
        info!("Gateway stopped: {}", self.coordinator.stats());
    }
}
