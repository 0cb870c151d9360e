//! Builder for creating console verifiers.

use std::path::PathBuf;
use std::time::Duration;

use super::config::VerifierConfig;
use super::verifier::ConsoleVerifier;
use crate::error::Result;
use crate::transport::ConsoleTarget;

/// Builder for constructing a [`ConsoleVerifier`].
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use consolecheck::VerifierBuilder;
///
/// # async fn example() -> Result<(), consolecheck::Error> {
/// let verifier = VerifierBuilder::unix("/run/vc/vm/sandbox/console.sock")
///     .response_timeout(Duration::from_secs(5))
///     .build()?;
///
/// let verdict = verifier.verify("ls /\n", "proc").await;
/// println!("{}", verdict);
/// # Ok(())
/// # }
/// ```
pub struct VerifierBuilder {
    config: VerifierConfig,
}

impl VerifierBuilder {
    /// Create a builder for a Unix socket console.
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Self::new(ConsoleTarget::unix(path))
    }

    /// Create a builder for a TCP console.
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::new(ConsoleTarget::tcp(host, port))
    }

    /// Create a builder for an explicit target.
    pub fn new(target: ConsoleTarget) -> Self {
        Self {
            config: VerifierConfig::new(target),
        }
    }

    /// Start from an existing configuration.
    pub fn from_config(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// Set the connect timeout (default: 10s).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.target.connect_timeout = timeout;
        self
    }

    /// Set the response deadline (default: 10s).
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.config.response_timeout = timeout;
        self
    }

    /// Set how many lines to discard before matching (default: 2).
    pub fn lines_to_skip(mut self, lines: usize) -> Self {
        self.config.lines_to_skip = lines;
        self
    }

    /// Set the length an unterminated line may reach before it is trimmed (default: 4096).
    pub fn max_line_length(mut self, length: usize) -> Self {
        self.config.max_line_length = length;
        self
    }

    /// Enable or disable ANSI escape stripping (default: disabled).
    pub fn strip_ansi(mut self, strip: bool) -> Self {
        self.config.strip_ansi = strip;
        self
    }

    /// Build the verifier, validating the configuration.
    ///
    /// This does not connect; each check opens its own connection.
    pub fn build(self) -> Result<ConsoleVerifier> {
        ConsoleVerifier::new(self.config)
    }
}
