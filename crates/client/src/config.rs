//! Client configuration and environment parsing.
//!
//! # Environment Variables
//!
//! | Variable | Description | Required |
//! |----------|-------------|----------|
//! | `ROWGRID_ADDR` | Service endpoint, `host:port` | Yes |
//! | `ROWGRID_CONNECT_TIMEOUT_MS` | Connect timeout in milliseconds | No |
//! | `ROWGRID_CALL_TIMEOUT_MS` | Per-call read/write timeout in milliseconds | No |

use std::{env, num::ParseIntError, str::FromStr, time::Duration};
use thiserror::Error;

/// Environment variable name for the service endpoint.
pub const ENV_ADDR: &str = "ROWGRID_ADDR";

/// Environment variable name for the connect timeout.
pub const ENV_CONNECT_TIMEOUT_MS: &str = "ROWGRID_CONNECT_TIMEOUT_MS";

/// Environment variable name for the per-call timeout.
pub const ENV_CALL_TIMEOUT_MS: &str = "ROWGRID_CALL_TIMEOUT_MS";

/// Error type for configuration parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// An endpoint string is not `host:port`.
    #[error("invalid endpoint {value:?}: expected host:port")]
    InvalidEndpoint {
        /// The offending value.
        value: String,
    },

    /// A port or timeout value failed to parse as an integer.
    #[error("invalid value {value:?} for {var}")]
    InvalidNumber {
        /// The variable or field being parsed.
        var: &'static str,
        /// The offending value.
        value: String,
        /// The underlying parse error.
        #[source]
        source: ParseIntError,
    },
}

/// Connection parameters for a [`RemoteClient`](crate::RemoteClient).
///
/// One transport session is opened per client for its whole lifetime; the
/// client does not reconnect automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host name or address of the service endpoint.
    pub host: String,
    /// Port of the service endpoint.
    pub port: u16,
    /// Timeout for establishing the connection, if any.
    pub connect_timeout: Option<Duration>,
    /// Read/write timeout applied to every call, if any.
    pub call_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a config with no timeouts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port, connect_timeout: None, call_timeout: None }
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the per-call read/write timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if `ROWGRID_ADDR` is not set,
    /// or a parse error if any variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var(ENV_ADDR).map_err(|_| ConfigError::MissingEnvVar(ENV_ADDR))?;
        let mut config: Self = addr.parse()?;
        if let Some(timeout) = env_timeout(ENV_CONNECT_TIMEOUT_MS)? {
            config.connect_timeout = Some(timeout);
        }
        if let Some(timeout) = env_timeout(ENV_CALL_TIMEOUT_MS)? {
            config.call_timeout = Some(timeout);
        }
        Ok(config)
    }
}

impl FromStr for ClientConfig {
    type Err = ConfigError;

    /// Parse a `host:port` endpoint into a config with no timeouts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::InvalidEndpoint { value: s.to_string() })?;
        if host.is_empty() {
            return Err(ConfigError::InvalidEndpoint { value: s.to_string() });
        }
        let port = port.parse().map_err(|source| ConfigError::InvalidNumber {
            var: "port",
            value: port.to_string(),
            source,
        })?;
        Ok(Self::new(host, port))
    }
}

fn env_timeout(var: &'static str) -> Result<Option<Duration>, ConfigError> {
    let Ok(value) = env::var(var) else { return Ok(None) };
    let millis: u64 = value.parse().map_err(|source| ConfigError::InvalidNumber {
        var,
        value,
        source,
    })?;
    Ok(Some(Duration::from_millis(millis)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_endpoint() {
        let config: ClientConfig = "grid.internal:9090".parse().unwrap();
        assert_eq!(config.host, "grid.internal");
        assert_eq!(config.port, 9090);
        assert_eq!(config.connect_timeout, None);
    }

    #[test]
    fn reject_malformed_endpoints() {
        assert!(matches!(
            "no-port".parse::<ClientConfig>(),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            ":9090".parse::<ClientConfig>(),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            "host:notaport".parse::<ClientConfig>(),
            Err(ConfigError::InvalidNumber { var: "port", .. })
        ));
    }
}
