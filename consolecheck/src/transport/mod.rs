//! Console transport layer.
//!
//! This module opens the stream connection to the console endpoint,
//! bounding connection establishment by a deadline.

pub mod config;
mod connection;

pub use config::{ConsoleTarget, Endpoint};
pub use connection::{Connection, connect};
#[cfg(test)]
pub(crate) use connection::connect_with;
