//! Line buffer for splitting console output into lines.
//!
//! Console output arrives in arbitrary chunks. The buffer accumulates them,
//! optionally strips ANSI escape sequences, and hands back complete lines.

use bytes::{Buf, Bytes, BytesMut};
use vte::{Parser, Perform};

/// Buffer that accumulates stream data and yields complete lines.
///
/// A line ends at `\n`. The terminator and a trailing `\r` are removed from
/// the returned line. An unterminated line is never returned by
/// [`next_line`](Self::next_line), however long it grows; see
/// [`overflow`](Self::overflow) for bounding it.
pub struct LineBuffer {
    /// Bytes received but not yet returned as a line.
    pending: BytesMut,

    /// Length an unterminated line may reach before it is trimmed.
    max_line_length: usize,

    /// Escape-sequence parser, present when ANSI stripping is enabled.
    parser: Option<Parser>,
}

impl LineBuffer {
    /// Create a new line buffer.
    ///
    /// # Arguments
    ///
    /// * `max_line_length` - Length an unterminated line may reach before
    ///   [`overflow`](Self::overflow) trims it.
    /// * `strip_ansi` - Remove ANSI escape sequences from incoming data.
    pub fn new(max_line_length: usize, strip_ansi: bool) -> Self {
        Self {
            pending: BytesMut::with_capacity(4096),
            max_line_length: max_line_length.max(1),
            parser: strip_ansi.then(Parser::new),
        }
    }

    /// Extend the buffer with newly received data.
    ///
    /// Escape sequences split across chunks are handled, the parser keeps
    /// its state between calls.
    pub fn extend(&mut self, data: &[u8]) {
        match self.parser.as_mut() {
            Some(parser) => parser.advance(&mut Printer(&mut self.pending), data),
            None => self.pending.extend_from_slice(data),
        }
    }

    /// Take the next complete line, if any.
    pub fn next_line(&mut self) -> Option<Bytes> {
        let pos = memchr::memchr(b'\n', &self.pending)?;
        let mut line = self.pending.split_to(pos + 1);
        line.truncate(pos);
        if line.last() == Some(&b'\r') {
            line.truncate(pos - 1);
        }
        Some(line.freeze())
    }

    /// Trim an unterminated line that grew past `max_line_length`.
    ///
    /// Returns the whole pending line so the caller can test it once more,
    /// then keeps only its last `keep` bytes. The line stays open: it is
    /// returned by [`next_line`](Self::next_line) once its terminator
    /// arrives. A match of up to `keep + 1` bytes spanning the cut is
    /// therefore still seen in one of the two.
    ///
    /// Must be called only after [`next_line`](Self::next_line) returned
    /// `None`.
    pub fn overflow(&mut self, keep: usize) -> Option<Bytes> {
        if self.pending.len() <= self.max_line_length {
            return None;
        }
        let keep = keep.min(self.max_line_length - 1);
        let seen = Bytes::copy_from_slice(&self.pending);
        self.pending.advance(self.pending.len() - keep);
        Some(seen)
    }

    /// Bytes of the unterminated trailing line.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new(4096, false)
    }
}

/// Writes printable output and line structure, dropping everything else.
struct Printer<'a>(&'a mut BytesMut);

impl Perform for Printer<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.0.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.0.extend_from_slice(&[byte]);
        }
    }
}
