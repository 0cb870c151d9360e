//! Named command/pattern checks.

use serde::Deserialize;

/// A command to send and the substring its response must contain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Check {
    /// Name used in reports.
    pub name: String,

    /// Command text, sent verbatim.
    pub command: String,

    /// Substring expected in a response line.
    pub pattern: String,
}

impl Check {
    /// Create a new check.
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            pattern: pattern.into(),
        }
    }
}
