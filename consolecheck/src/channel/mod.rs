//! Channel layer for reading and matching console output.
//!
//! This module splits the console byte stream into lines, strips ANSI
//! escape codes, and scans the lines for an expected pattern.

mod buffer;
mod matcher;
mod patterns;

pub use buffer::LineBuffer;
pub use matcher::{MatchReport, ResponseMatcher};
pub use patterns::{LineMatcher, Pattern};
