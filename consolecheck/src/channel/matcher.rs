//! Response matcher that scans console output line by line.

use std::sync::Arc;

use log::trace;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::buffer::LineBuffer;
use super::patterns::LineMatcher;
use crate::error::{ChannelError, Result};

/// Outcome of a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchReport {
    /// The line that contained the pattern (lossy UTF-8).
    pub line: String,

    /// Number of lines read, including skipped ones and the matching line.
    pub lines_read: usize,
}

/// Reads lines from a stream until one matches.
///
/// The first `lines_to_skip` lines are discarded unconditionally. With the
/// guest debug console these are the shell's echo of the command and one
/// prompt line; other consoles may need a different count.
#[derive(Clone)]
pub struct ResponseMatcher {
    matcher: Arc<dyn LineMatcher>,
    lines_to_skip: usize,
    max_line_length: usize,
    strip_ansi: bool,
}

impl ResponseMatcher {
    /// Create a matcher skipping `lines_to_skip` lines before matching.
    pub fn new(matcher: Arc<dyn LineMatcher>, lines_to_skip: usize) -> Self {
        Self {
            matcher,
            lines_to_skip,
            max_line_length: 4096,
            strip_ansi: false,
        }
    }

    /// Set the longest line kept before it is cut.
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    /// Enable or disable ANSI escape stripping.
    pub fn with_strip_ansi(mut self, strip_ansi: bool) -> Self {
        self.strip_ansi = strip_ansi;
        self
    }

    /// Number of lines discarded before matching starts.
    pub fn lines_to_skip(&self) -> usize {
        self.lines_to_skip
    }

    /// Read from `reader` until a line matches.
    ///
    /// There is no bound on the number of lines examined; this returns only
    /// on a match, a read error, or end of stream. Callers bound it with a
    /// deadline. A trailing partial line at end of stream is not tested.
    ///
    /// A line counts only once its terminator arrives, however long it is.
    /// An unterminated line longer than `max_line_length` is tested as it
    /// stands (unless it is in the skip window) and then trimmed, keeping
    /// enough of its end for a match across the cut.
    pub async fn run<R>(self, mut reader: R) -> Result<MatchReport>
    where
        R: AsyncRead + Unpin,
    {
        let mut buffer = LineBuffer::new(self.max_line_length, self.strip_ansi);
        let mut chunk = vec![0u8; 4096];
        let mut lines_read = 0;
        let keep = match self.matcher.max_match_len() {
            Some(len) => len.saturating_sub(1),
            None => self.max_line_length / 2,
        };

        loop {
            while let Some(line) = buffer.next_line() {
                lines_read += 1;
                let text = String::from_utf8_lossy(&line);
                trace!("rx: {}", text);

                if lines_read <= self.lines_to_skip {
                    continue;
                }

                if self.matcher.is_match(&line) {
                    return Ok(MatchReport {
                        line: text.into_owned(),
                        lines_read,
                    });
                }
            }

            if let Some(partial) = buffer.overflow(keep) {
                let line_no = lines_read + 1;
                trace!("rx: line {} over {} bytes, trimmed", line_no, partial.len());

                if line_no > self.lines_to_skip && self.matcher.is_match(&partial) {
                    return Ok(MatchReport {
                        line: String::from_utf8_lossy(&partial).into_owned(),
                        lines_read: line_no,
                    });
                }
            }

            let n = reader.read(&mut chunk).await.map_err(ChannelError::Read)?;
            if n == 0 {
                return Err(ChannelError::Closed { lines_read }.into());
            }
            buffer.extend(&chunk[..n]);
        }
    }
}
