//! Raw GATT characteristic decoding
//!
//! The sensor node exposes each channel as its own characteristic, encoded
//! the way the firmware stores it in memory:
//!
//! | Channel     | Bytes | Encoding            |
//! |-------------|-------|---------------------|
//! | temperature | 4     | f32, little-endian  |
//! | humidity    | 4     | f32, little-endian  |
//! | air quality | 2     | u16, little-endian  |
//! | light level | 2     | u16, little-endian  |
//!
//! Device adapters collect the four raw values and hand them to
//! [`CharacteristicValues::decode`], which performs both the byte-level checks
//! and the sample validation in one step.

use alloc::string::String;

use crate::errors::{SampleError, SampleResult};
use crate::sample::SensorSample;
use crate::time::Timestamp;

/// Raw characteristic payloads as read from the node
#[derive(Debug, Clone, Copy)]
pub struct CharacteristicValues<'a> {
    /// Little-endian `f32`, °C
    pub temperature: &'a [u8],
    /// Little-endian `f32`, % relative humidity
    pub humidity: &'a [u8],
    /// Little-endian `u16` index
    pub air_quality: &'a [u8],
    /// Little-endian `u16`, lux
    pub light_level: &'a [u8],
}

impl<'a> CharacteristicValues<'a> {
    /// Decode into a validated sample
    pub fn decode(
        &self,
        device_id: impl Into<String>,
        captured_at: Timestamp,
    ) -> SampleResult<SensorSample> {
        SensorSample::builder(device_id)
            .captured_at(captured_at)
            .temperature(read_f32("temperature", self.temperature)?)
            .humidity(read_f32("humidity", self.humidity)?)
            .air_quality(read_u16("air_quality", self.air_quality)?)
            .light_level(read_u16("light_level", self.light_level)?)
            .build()
    }
}

fn read_f32(field: &'static str, raw: &[u8]) -> SampleResult<f32> {
    let bytes: [u8; 4] = raw.try_into().map_err(|_| SampleError::InvalidLength {
        field,
        expected: 4,
        actual: raw.len(),
    })?;
    Ok(f32::from_le_bytes(bytes))
}

fn read_u16(field: &'static str, raw: &[u8]) -> SampleResult<u16> {
    let bytes: [u8; 2] = raw.try_into().map_err(|_| SampleError::InvalidLength {
        field,
        expected: 2,
        actual: raw.len(),
    })?;
    Ok(u16::from_le_bytes(bytes))
}
