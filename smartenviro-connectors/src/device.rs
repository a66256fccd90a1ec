//! Sensor device seam
//!
//! The BLE link (scanning, pairing, characteristic discovery) lives outside
//! the gateway core. Whatever drives it implements [`SensorDevice`] and hands
//! over validated [`SensorSample`]s; raw characteristic bytes go through
//! [`CharacteristicValues::decode`] so every adapter shares one decoder.
//!
//! [`SimulatedDevice`] is the in-process adapter used when no radio is
//! available. It produces a smooth, deterministic pattern through the same
//! byte-level decoding path a real node would.

use smartenviro_core::time::TimeSource;
use smartenviro_core::{CharacteristicValues, SampleError, SensorSample};
use thiserror::Error;

/// Device adapter failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeviceError {
    #[error("Device not connected")]
    NotConnected,

    /// The node answered with bytes that do not form a valid sample
    #[error("Malformed sample: {0}")]
    Malformed(#[from] SampleError),

    /// The read itself failed; the next read may succeed
    #[error("Read failed: {0}")]
    Read(String),
}

/// Source of sensor samples
#[async_trait::async_trait]
pub trait SensorDevice: Send {
    /// Find the node and open a link to it; `false` if it could not be reached
    async fn scan_and_connect(&mut self) -> bool;

    /// Read the four channels once
    ///
    /// `Ok(None)` means no reading is available this time.
    async fn read_sample(&mut self) -> Result<Option<SensorSample>, DeviceError>;

    /// Drop the link; safe to call when not connected
    async fn disconnect(&mut self);
}

/// Synthetic sensor node
///
/// Channels follow slow sine/cosine curves around typical indoor values.
/// Capture times come from the supplied [`TimeSource`], so tests can pin them.
pub struct SimulatedDevice {
    device_id: String,
    clock: Box<dyn TimeSource>,
    tick: u32,
    connected: bool,
}

impl SimulatedDevice {
    pub fn new(device_id: impl Into<String>, clock: Box<dyn TimeSource>) -> Self {
        Self {
            device_id: device_id.into(),
            clock,
            tick: 0,
            connected: false,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Number of samples produced so far
    pub fn reads(&self) -> u32 {
        self.tick
    }

    fn channels(tick: u32) -> ([u8; 4], [u8; 4], [u8; 2], [u8; 2]) {
        let phase = tick as f32 / 30.0;
        let temperature = 22.0 + 3.0 * phase.sin();
        let humidity = 45.0 + 10.0 * phase.cos();
        let air_quality = (50.0 + 25.0 * (phase / 2.0).sin()) as u16;
        let light_level = (300.0 + 200.0 * (phase / 4.0).cos()) as u16;

        (
            temperature.to_le_bytes(),
            humidity.to_le_bytes(),
            air_quality.to_le_bytes(),
            light_level.to_le_bytes(),
        )
    }
}

#[async_trait::async_trait]
impl SensorDevice for SimulatedDevice {
    async fn scan_and_connect(&mut self) -> bool {
        log::info!("simulated device {} connected", self.device_id);
        self.connected = true;
        true
    }

    async fn read_sample(&mut self) -> Result<Option<SensorSample>, DeviceError> {
        if !self.connected {
            return Err(DeviceError::NotConnected);
        }

        let (temperature, humidity, air_quality, light_level) = Self::channels(self.tick);
        self.tick = self.tick.wrapping_add(1);

        let raw = CharacteristicValues {
            temperature: &temperature,
            humidity: &humidity,
            air_quality: &air_quality,
            light_level: &light_level,
        };
        Ok(Some(raw.decode(self.device_id.as_str(), self.clock.now())?))
    }

    async fn disconnect(&mut self) {
        if self.connected {
            log::info!("simulated device {} disconnected", self.device_id);
        }
        self.connected = false;
    }
}
