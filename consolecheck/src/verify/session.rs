//! Per-check session state tracking.

use std::fmt;
use std::time::Instant;

use log::debug;

use super::verdict::Verdict;
use crate::channel::MatchReport;
use crate::error::{ChannelError, Error, FailureKind, Result};

/// States a check session passes through.
///
/// `Closed` is terminal and reachable from every other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Connected,
    CommandSent,
    Reading,
    Matched,
    TimedOut,
    ReadError,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "IDLE",
            SessionState::Connecting => "CONNECTING",
            SessionState::Connected => "CONNECTED",
            SessionState::CommandSent => "COMMAND_SENT",
            SessionState::Reading => "READING",
            SessionState::Matched => "MATCHED",
            SessionState::TimedOut => "TIMED_OUT",
            SessionState::ReadError => "READ_ERROR",
            SessionState::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

/// One command/pattern exchange, from creation until the verdict.
pub(crate) struct Session {
    command: String,
    pattern: String,
    start: Instant,
    states: Vec<SessionState>,
}

impl Session {
    pub(crate) fn new(command: &str, pattern: &str) -> Self {
        Self {
            command: command.to_string(),
            pattern: pattern.to_string(),
            start: Instant::now(),
            states: vec![SessionState::Idle],
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.states
            .last()
            .copied()
            .unwrap_or(SessionState::Idle)
    }

    pub(crate) fn advance(&mut self, next: SessionState) {
        debug!("session {:?}: {} -> {}", self.command.trim_end(), self.state(), next);
        self.states.push(next);
    }

    /// Record the outcome, close the session and build the verdict.
    pub(crate) fn finish(mut self, result: Result<MatchReport>) -> Verdict {
        if self.state() == SessionState::Reading {
            let terminal = match &result {
                Ok(_) => SessionState::Matched,
                Err(e) if e.kind() == FailureKind::Timeout => SessionState::TimedOut,
                Err(_) => SessionState::ReadError,
            };
            self.advance(terminal);
        }
        self.advance(SessionState::Closed);

        let elapsed = self.start.elapsed();
        match result {
            Ok(report) => Verdict::matched(self.command, self.pattern, report, elapsed, self.states),
            Err(error) => {
                let lines_read = match &error {
                    Error::Channel(ChannelError::Closed { lines_read }) => *lines_read,
                    _ => 0,
                };
                Verdict::failed(
                    self.command,
                    self.pattern,
                    error,
                    lines_read,
                    elapsed,
                    self.states,
                )
            }
        }
    }
}
