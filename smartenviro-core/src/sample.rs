//! Sensor Samples and Their Wire Encoding
//!
//! ## Overview
//!
//! A `SensorSample` is one timestamped reading of the four environmental
//! channels a SmartEnviro node reports. It is created once by the device
//! adapter and then only moved: into the offline backlog, out of it, and
//! finally into a broker payload.
//!
//! ## Immutability
//!
//! All fields are private and the only way to obtain a sample is through
//! [`SensorSampleBuilder::build`], which validates every channel. Code holding
//! a `SensorSample` can therefore assume it is well-formed and never needs to
//! re-check it before publishing.
//!
//! ## Wire Format
//!
//! The cloud consumer parses a flat JSON object. Field set and order are part
//! of the contract:
//!
//! ```text
//! {
//!   "device_id":   "SmartEnviro-Gateway-01",   string
//!   "timestamp":   "2024-01-01T12:00:00.000Z", ISO-8601, UTC, millis
//!   "temperature": 23.46,                      °C, 2 decimal places
//!   "humidity":    45.1,                       % RH, 2 decimal places
//!   "air_quality": 42,                         integer index
//!   "light_level": 300                         integer lux
//! }
//! ```
//!
//! Rounding happens after widening to `f64` so that float noise from the
//! node's `f32` values (`23.45f32` is `23.4500007...`) never leaks onto the
//! wire.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use chrono::SecondsFormat;
use serde::Serialize;

use crate::constants::buffers::{HUMIDITY_MAX_PCT, HUMIDITY_MIN_PCT, WIRE_DECIMAL_PLACES};
use crate::errors::{SampleError, SampleResult};
use crate::time::Timestamp;

/// One validated, immutable reading from a sensor node
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSample {
    device_id: String,
    captured_at: Timestamp,
    temperature: f32,
    humidity: f32,
    air_quality: u16,
    light_level: u16,
}

/// Serialized view of a sample; field order is the wire order
#[derive(Serialize)]
struct WireMessage<'a> {
    device_id: &'a str,
    timestamp: String,
    temperature: f64,
    humidity: f64,
    air_quality: u16,
    light_level: u16,
}

impl SensorSample {
    /// Start building a sample for `device_id`
    pub fn builder(device_id: impl Into<String>) -> SensorSampleBuilder {
        SensorSampleBuilder::new(device_id)
    }

    /// Node the reading came from
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Capture time on the node
    pub fn captured_at(&self) -> Timestamp {
        self.captured_at
    }

    /// Temperature in °C
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Relative humidity in %
    pub fn humidity(&self) -> f32 {
        self.humidity
    }

    /// Air quality index
    pub fn air_quality(&self) -> u16 {
        self.air_quality
    }

    /// Illuminance in lux
    pub fn light_level(&self) -> u16 {
        self.light_level
    }

    /// Encode as the JSON object the cloud consumer expects
    pub fn to_json(&self) -> SampleResult<String> {
        serde_json::to_string(&self.wire()).map_err(|_| SampleError::Encoding)
    }

    /// Encode as a broker payload
    pub fn to_payload(&self) -> SampleResult<Vec<u8>> {
        serde_json::to_vec(&self.wire()).map_err(|_| SampleError::Encoding)
    }

    fn wire(&self) -> WireMessage<'_> {
        WireMessage {
            device_id: &self.device_id,
            timestamp: self.captured_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            temperature: round_for_wire(self.temperature),
            humidity: round_for_wire(self.humidity),
            air_quality: self.air_quality,
            light_level: self.light_level,
        }
    }
}

impl fmt::Display for SensorSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "temp={:.1}°C humidity={:.1}% aq={} light={}lux",
            self.temperature, self.humidity, self.air_quality, self.light_level
        )
    }
}

/// Round to the wire precision without truncating
fn round_for_wire(value: f32) -> f64 {
    let scale = libm::pow(10.0, WIRE_DECIMAL_PLACES as f64);
    libm::round(value as f64 * scale) / scale
}

/// Builder for [`SensorSample`]
///
/// Every field is required, the capture time included: a sample never
/// borrows the gateway's clock or a placeholder epoch.
#[derive(Debug, Clone)]
pub struct SensorSampleBuilder {
    device_id: String,
    captured_at: Option<Timestamp>,
    temperature: Option<f32>,
    humidity: Option<f32>,
    air_quality: Option<u16>,
    light_level: Option<u16>,
}

impl SensorSampleBuilder {
    /// Empty builder for `device_id`
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            captured_at: None,
            temperature: None,
            humidity: None,
            air_quality: None,
            light_level: None,
        }
    }

    /// When the node took the reading
    pub fn captured_at(mut self, at: Timestamp) -> Self {
        self.captured_at = Some(at);
        self
    }

    /// Temperature in °C
    pub fn temperature(mut self, celsius: f32) -> Self {
        self.temperature = Some(celsius);
        self
    }

    /// Relative humidity in %, 0-100
    pub fn humidity(mut self, percent: f32) -> Self {
        self.humidity = Some(percent);
        self
    }

    /// Air quality index
    pub fn air_quality(mut self, index: u16) -> Self {
        self.air_quality = Some(index);
        self
    }

    /// Illuminance in lux
    pub fn light_level(mut self, lux: u16) -> Self {
        self.light_level = Some(lux);
        self
    }

    /// Validate and freeze the sample
    ///
    /// Fails with the first problem found, checked in wire order.
    pub fn build(self) -> SampleResult<SensorSample> {
        if self.device_id.trim().is_empty() {
            return Err(SampleError::EmptyDeviceId);
        }

        let captured_at = self
            .captured_at
            .ok_or(SampleError::MissingField { field: "captured_at" })?;

        let temperature = self
            .temperature
            .ok_or(SampleError::MissingField { field: "temperature" })?;
        if !temperature.is_finite() {
            return Err(SampleError::NotFinite { field: "temperature" });
        }

        let humidity = self
            .humidity
            .ok_or(SampleError::MissingField { field: "humidity" })?;
        if !humidity.is_finite() {
            return Err(SampleError::NotFinite { field: "humidity" });
        }
        if !(HUMIDITY_MIN_PCT..=HUMIDITY_MAX_PCT).contains(&humidity) {
            return Err(SampleError::OutOfRange {
                field: "humidity",
                value: humidity,
                min: HUMIDITY_MIN_PCT,
                max: HUMIDITY_MAX_PCT,
            });
        }

        let air_quality = self
            .air_quality
            .ok_or(SampleError::MissingField { field: "air_quality" })?;
        let light_level = self
            .light_level
            .ok_or(SampleError::MissingField { field: "light_level" })?;

        Ok(SensorSample {
            device_id: self.device_id,
            captured_at,
            temperature,
            humidity,
            air_quality,
            light_level,
        })
    }
}
