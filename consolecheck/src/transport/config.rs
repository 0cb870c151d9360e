//! Console connection configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{DriverError, Result};

/// Where the console listens.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    /// Filesystem socket, e.g. a hypervisor console socket.
    Unix(PathBuf),

    /// TCP host and port.
    Tcp { host: String, port: u16 },
}

impl Endpoint {
    fn is_empty(&self) -> bool {
        match self {
            Endpoint::Unix(path) => path.as_os_str().is_empty(),
            Endpoint::Tcp { host, .. } => host.is_empty(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "{}", path.display()),
            Endpoint::Tcp { host, port } => write!(f, "{}:{}", host, port),
        }
    }
}

/// Console connection target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConsoleTarget {
    /// Address of the console.
    pub endpoint: Endpoint,

    /// Bound on connection establishment.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: Duration,
}

pub(crate) fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

impl ConsoleTarget {
    /// Target a Unix socket path with the default connect timeout.
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Self {
            endpoint: Endpoint::Unix(path.into()),
            connect_timeout: default_connect_timeout(),
        }
    }

    /// Target a TCP address with the default connect timeout.
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self {
            endpoint: Endpoint::Tcp {
                host: host.into(),
                port,
            },
            connect_timeout: default_connect_timeout(),
        }
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Check that the address is non-empty and the timeout positive.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(DriverError::InvalidConfig {
                message: "console address must not be empty".to_string(),
            }
            .into());
        }
        if self.connect_timeout.is_zero() {
            return Err(DriverError::InvalidConfig {
                message: "connect timeout must be greater than zero".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Human-readable address, used in errors and logs.
    pub fn address(&self) -> String {
        self.endpoint.to_string()
    }
}
