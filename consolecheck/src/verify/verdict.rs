//! Verdict type for check results.

use std::fmt;
use std::time::Duration;

use super::session::SessionState;
use crate::channel::MatchReport;
use crate::error::{Error, FailureKind};

/// How a check session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The pattern was seen before the deadline.
    Matched,

    /// The deadline elapsed with no verdict.
    TimedOut,

    /// An error ended the session before a match.
    Failed,
}

/// Result of a single check.
///
/// Never an error itself: connection, write, read and timeout failures are
/// all captured here so one failed check cannot abort a batch.
#[derive(Debug)]
pub struct Verdict {
    /// The command that was sent.
    pub command: String,

    /// The pattern that was searched for.
    pub pattern: String,

    /// How the session ended.
    pub outcome: Outcome,

    /// The line that matched, if any.
    pub matched_line: Option<String>,

    /// Lines read from the console, when known.
    pub lines_read: usize,

    /// Time from session start to close.
    pub elapsed: Duration,

    /// States the session went through, ending in `Closed`.
    pub states: Vec<SessionState>,

    /// The captured cause when the check did not pass.
    pub error: Option<Error>,
}

impl Verdict {
    pub(crate) fn matched(
        command: String,
        pattern: String,
        report: MatchReport,
        elapsed: Duration,
        states: Vec<SessionState>,
    ) -> Self {
        Self {
            command,
            pattern,
            outcome: Outcome::Matched,
            matched_line: Some(report.line),
            lines_read: report.lines_read,
            elapsed,
            states,
            error: None,
        }
    }

    pub(crate) fn failed(
        command: String,
        pattern: String,
        error: Error,
        lines_read: usize,
        elapsed: Duration,
        states: Vec<SessionState>,
    ) -> Self {
        let outcome = if error.is_timeout() {
            Outcome::TimedOut
        } else {
            Outcome::Failed
        };
        Self {
            command,
            pattern,
            outcome,
            matched_line: None,
            lines_read,
            elapsed,
            states,
            error: Some(error),
        }
    }

    /// Check if the pattern was matched.
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Matched
    }

    /// The captured error, if the check did not pass.
    pub fn cause(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Classification of the failure, if the check did not pass.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.error.as_ref().map(Error::kind)
    }

    /// The last state before the session closed.
    pub fn last_state(&self) -> SessionState {
        self.states
            .iter()
            .rev()
            .find(|s| **s != SessionState::Closed)
            .copied()
            .unwrap_or(SessionState::Idle)
    }

    /// Whether the session got as far as sending the command.
    pub fn command_sent(&self) -> bool {
        self.states.contains(&SessionState::CommandSent)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let command = self.command.trim_end();
        match (&self.outcome, &self.error) {
            (Outcome::Matched, _) => write!(
                f,
                "PASS {:?}: found {:?} in {:?} ({:?})",
                command,
                self.pattern,
                self.matched_line.as_deref().unwrap_or_default(),
                self.elapsed
            ),
            (_, Some(error)) => write!(f, "FAIL {:?}: {}", command, error),
            (_, None) => write!(f, "FAIL {:?}", command),
        }
    }
}
