//! Gateway error types
//!
//! Only startup can fail. Once the loop is running every broker or device
//! problem is reported as a [`PublishEvent`](crate::PublishEvent) and the
//! loop carries on.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration could not be loaded or is unusable
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::Invalid { field, reason }
    }
}

/// Fatal gateway failures
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Startup configuration was unreadable or invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The sensor node could not be found or connected at startup
    #[error("sensor device `{0}` unavailable")]
    DeviceUnavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        let err = ConfigError::invalid("buffer_capacity", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid value for `buffer_capacity`: must be at least 1"
        );

        let err: GatewayError = err.into();
        assert!(err.to_string().contains("buffer_capacity"));
    }

    #[test]
    fn io_error_names_the_path() {
        let err = ConfigError::Io {
            path: PathBuf::from("/etc/smartenviro.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().starts_with("failed to read /etc/smartenviro.json"));
    }
}
