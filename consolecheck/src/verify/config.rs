//! Verifier configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{DriverError, Result};
use crate::transport::ConsoleTarget;

/// Settings for a [`ConsoleVerifier`](super::ConsoleVerifier).
///
/// Passed explicitly into every session; nothing is read from global state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifierConfig {
    /// Console to connect to.
    pub target: ConsoleTarget,

    /// Overall deadline for sending the command and seeing the pattern.
    /// Independent of the connect timeout.
    #[serde(default = "default_response_timeout")]
    pub response_timeout: Duration,

    /// Lines discarded after sending the command, before matching starts.
    ///
    /// The guest debug console echoes the command and then prints a prompt
    /// line, hence the default of 2. Other consoles may differ.
    #[serde(default = "default_lines_to_skip")]
    pub lines_to_skip: usize,

    /// Length an unterminated response line may reach before it is trimmed.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,

    /// Strip ANSI escape sequences before matching (default: off).
    ///
    /// Lines are then matched on the text the terminal would print, not on
    /// the raw bytes. An escape string that is never terminated (OSC, DCS)
    /// swallows every following line ending, so the check can only end at
    /// the deadline.
    #[serde(default = "default_strip_ansi")]
    pub strip_ansi: bool,
}

fn default_response_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_lines_to_skip() -> usize {
    2
}

fn default_max_line_length() -> usize {
    4096
}

fn default_strip_ansi() -> bool {
    false
}

impl VerifierConfig {
    /// Create a config for `target` with default settings.
    pub fn new(target: ConsoleTarget) -> Self {
        Self {
            target,
            response_timeout: default_response_timeout(),
            lines_to_skip: default_lines_to_skip(),
            max_line_length: default_max_line_length(),
            strip_ansi: default_strip_ansi(),
        }
    }

    /// Check all invariants of the configuration.
    pub fn validate(&self) -> Result<()> {
        self.target.validate()?;

        if self.response_timeout.is_zero() {
            return Err(DriverError::InvalidConfig {
                message: "response timeout must be greater than zero".to_string(),
            }
            .into());
        }

        if self.max_line_length == 0 {
            return Err(DriverError::InvalidConfig {
                message: "max line length must be greater than zero".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
