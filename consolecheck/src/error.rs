//! Error types for consolecheck.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Main error type for consolecheck operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection establishment errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Errors while talking over an open console stream
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Verifier configuration errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Orchestration (setup/teardown) errors
    #[error("Harness error: {0}")]
    Harness(#[from] HarnessError),
}

/// Coarse classification of why a check did not pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The verifier was misconfigured.
    Config,
    /// The console could not be reached.
    Connect,
    /// The command could not be fully sent.
    Write,
    /// The stream failed or closed before a match.
    Read,
    /// The deadline elapsed with no verdict.
    Timeout,
    /// Environment preparation or teardown failed.
    Harness,
}

impl Error {
    /// Classify this error into a [`FailureKind`].
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Transport(_) => FailureKind::Connect,
            Error::Channel(e) => e.kind(),
            Error::Driver(_) => FailureKind::Config,
            Error::Harness(_) => FailureKind::Harness,
        }
    }

    /// Whether this error is a deadline expiry.
    pub fn is_timeout(&self) -> bool {
        self.kind() == FailureKind::Timeout
    }
}

/// Transport layer errors (opening the console connection).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Nothing is listening at the address
    #[error("Connection refused by {address}")]
    ConnectionRefused { address: String },

    /// Connection establishment exceeded its bound
    #[error("Connection to {address} timed out after {timeout:?}")]
    ConnectTimeout { address: String, timeout: Duration },

    /// The socket path does not exist
    #[error("Console socket {address} not found")]
    NotFound { address: String },

    /// Any other connection failure
    #[error("Connection failed to {address}: {source}")]
    ConnectionFailed {
        address: String,
        #[source]
        source: io::Error,
    },
}

/// Channel layer errors (command write, response matching).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Patterns must contain at least one byte
    #[error("Pattern must not be empty")]
    EmptyPattern,

    /// The command could not be fully written
    #[error("Failed to send command: {0}")]
    Write(#[source] io::Error),

    /// Reading from the stream failed
    #[error("Failed to read response: {0}")]
    Read(#[source] io::Error),

    /// The peer closed the stream before the pattern was seen
    #[error("Channel closed after {lines_read} lines without a match")]
    Closed { lines_read: usize },

    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    Timeout(Duration),

    /// The matcher task ended without delivering a result
    #[error("Matcher task ended without a verdict")]
    MatcherLost,
}

impl ChannelError {
    /// Classify this error into a [`FailureKind`].
    pub fn kind(&self) -> FailureKind {
        match self {
            ChannelError::EmptyPattern => FailureKind::Config,
            ChannelError::Write(_) => FailureKind::Write,
            ChannelError::Read(_) | ChannelError::Closed { .. } | ChannelError::MatcherLost => {
                FailureKind::Read
            }
            ChannelError::Timeout(_) => FailureKind::Timeout,
        }
    }
}

/// Verifier-level errors.
#[derive(Error, Debug)]
pub enum DriverError {
    /// Invalid configuration in the verifier builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Orchestration harness errors.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The external program could not be started
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The external program exited unsuccessfully
    #[error("'{program}' exited with {status}: {stderr}")]
    ProcessFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The external program did not finish in time
    #[error("'{program}' did not finish within {timeout:?}")]
    ProcessTimeout { program: String, timeout: Duration },

    /// Creating the mount fixture failed
    #[error("Fixture error: {0}")]
    Fixture(#[source] io::Error),

    /// Saving or restoring a config backup failed
    #[error("Backup of '{path}' failed: {source}")]
    Backup {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A setup step failed and the scenario was aborted
    #[error("Setup step '{step}' failed: {message}")]
    SetupFailed { step: String, message: String },
}

/// Result type alias using consolecheck's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds() {
        let err: Error = TransportError::NotFound {
            address: "/tmp/missing.sock".into(),
        }
        .into();
        assert_eq!(err.kind(), FailureKind::Connect);

        let err: Error = ChannelError::Timeout(Duration::from_secs(1)).into();
        assert!(err.is_timeout());

        let err: Error = ChannelError::Closed { lines_read: 2 }.into();
        assert_eq!(err.kind(), FailureKind::Read);

        let err: Error = ChannelError::Write(io::ErrorKind::BrokenPipe.into()).into();
        assert_eq!(err.kind(), FailureKind::Write);
    }

    #[test]
    fn test_display_mentions_address() {
        let err = TransportError::ConnectionRefused {
            address: "/run/console.sock".into(),
        };
        assert!(err.to_string().contains("/run/console.sock"));
    }
}
