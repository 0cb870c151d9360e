//! Pattern matching for response lines.

use std::fmt;

use memchr::memmem::Finder;
use regex::bytes::Regex;

use crate::error::ChannelError;

/// Trait for line matching - plain substring by default, extensible for custom matchers.
pub trait LineMatcher: Send + Sync {
    /// Check whether a single response line matches.
    fn is_match(&self, line: &[u8]) -> bool;

    /// Longest input a match can span, if bounded.
    ///
    /// Used to decide how much of an over-long line to keep when it is
    /// trimmed. `None` keeps half of the line limit.
    fn max_match_len(&self) -> Option<usize> {
        None
    }
}

/// Regex-based line matcher, for callers that need more than a substring.
impl LineMatcher for Regex {
    fn is_match(&self, line: &[u8]) -> bool {
        Regex::is_match(self, line)
    }
}

/// A non-empty substring searched for in each response line.
///
/// This is a plain containment test, not a regular expression.
#[derive(Debug, Clone)]
pub struct Pattern {
    text: String,
    finder: Finder<'static>,
}

impl Pattern {
    /// Create a pattern, rejecting the empty string.
    pub fn new(text: impl Into<String>) -> Result<Self, ChannelError> {
        let text = text.into();
        if text.is_empty() {
            return Err(ChannelError::EmptyPattern);
        }
        let finder = Finder::new(text.as_bytes()).into_owned();
        Ok(Self { text, finder })
    }

    /// The substring being searched for.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl LineMatcher for Pattern {
    fn is_match(&self, line: &[u8]) -> bool {
        self.finder.find(line).is_some()
    }

    fn max_match_len(&self) -> Option<usize> {
        Some(self.text.len())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
