//! Error Types for Malformed Sensor Samples
//!
//! ## Design Philosophy
//!
//! A malformed sample is never fatal. The gateway drops it, reports it, and
//! keeps reading. The error therefore only has to carry enough context for a
//! log line, and it is kept in the same shape as every other hot-path error:
//!
//! 1. **Small Size**: a discriminant plus at most a couple of words.
//!
//! 2. **No Heap Allocation**: field names are `&'static str`, never `String`.
//!
//! 3. **Copy Semantics**: errors can be stored in events and stats freely.
//!
//! ## Error Categories
//!
//! ### Construction
//! - `MissingField`: the builder was finished without a required reading
//! - `EmptyDeviceId`: the sample cannot be attributed to a device
//!
//! ### Value Checks
//! - `NotFinite`: NaN or infinity from a corrupt characteristic read
//! - `OutOfRange`: relative humidity outside 0-100 %
//!
//! ### Decoding
//! - `InvalidLength`: a raw characteristic had the wrong byte count
//!
//! ### Encoding
//! - `Encoding`: the wire encoder refused the sample
//!
//! ## Handling
//!
//! ```rust
//! use chrono::Utc;
//! use smartenviro_core::{SampleError, SensorSampleBuilder};
//!
//! let result = SensorSampleBuilder::new("node-01")
//!     .captured_at(Utc::now())
//!     .temperature(f32::NAN)
//!     .humidity(40.0)
//!     .air_quality(10)
//!     .light_level(100)
//!     .build();
//!
//! match result {
//!     Err(SampleError::NotFinite { field }) => assert_eq!(field, "temperature"),
//!     _ => unreachable!(),
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for sample construction and encoding
pub type SampleResult<T> = Result<T, SampleError>;

/// Reasons a sample is rejected as malformed
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SampleError {
    /// A required reading was never supplied
    #[error("Missing field: {field}")]
    MissingField {
        /// Name of the missing field
        field: &'static str,
    },

    /// Device identifier was empty
    #[error("Device id must not be empty")]
    EmptyDeviceId,

    /// Reading was NaN or infinite
    #[error("Field {field} is not a finite number")]
    NotFinite {
        /// Name of the offending field
        field: &'static str,
    },

    /// Reading outside its physical range
    #[error("Field {field} value {value} outside [{min}, {max}]")]
    OutOfRange {
        /// Name of the offending field
        field: &'static str,
        /// The value as read
        value: f32,
        /// Lowest accepted value
        min: f32,
        /// Highest accepted value
        max: f32,
    },

    /// Raw characteristic payload had the wrong size
    #[error("Characteristic {field} expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Name of the characteristic
        field: &'static str,
        /// Byte count the encoding requires
        expected: usize,
        /// Byte count received
        actual: usize,
    },

    /// Wire encoding failed
    #[error("Sample could not be encoded")]
    Encoding,
}

impl SampleError {
    /// Name of the field the error refers to, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { field }
            | Self::NotFinite { field }
            | Self::OutOfRange { field, .. }
            | Self::InvalidLength { field, .. } => Some(field),
            Self::EmptyDeviceId => Some("device_id"),
            Self::Encoding => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lookup() {
        assert_eq!(
            SampleError::NotFinite { field: "humidity" }.field(),
            Some("humidity")
        );
        assert_eq!(SampleError::EmptyDeviceId.field(), Some("device_id"));
        assert_eq!(SampleError::Encoding.field(), None);
    }

    #[test]
    fn display_includes_context() {
        let err = SampleError::InvalidLength {
            field: "temperature",
            expected: 4,
            actual: 2,
        };
        assert_eq!(
            format!("{}", err),
            "Characteristic temperature expected 4 bytes, got 2"
        );
    }
}
