//! # Consolecheck
//!
//! Async command/response verification over a sandbox debug console.
//!
//! Consolecheck connects to a console stream (a Unix socket or TCP port),
//! sends one command, and waits for a response line containing an expected
//! substring. The wait is bounded by a deadline and the connection is
//! always closed before a result is reported.
//!
//! ## Features
//!
//! - Unix socket and TCP console transports with bounded connects
//! - Line framing with optional ANSI escape stripping
//! - Substring matching via memchr, or any custom [`LineMatcher`]
//! - Reader task raced against a deadline and cancelled on timeout
//! - Detailed [`Verdict`] with failure cause and session state path
//! - Harness for config edits, mount fixtures and container lifecycle
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use consolecheck::VerifierBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), consolecheck::Error> {
//!     let verifier = VerifierBuilder::unix("/run/vc/vm/foobar/console.sock")
//!         .response_timeout(Duration::from_secs(10))
//!         .build()?;
//!
//!     let verdict = verifier.verify("ls /\n", "etc").await;
//!     println!("{}", verdict);
//!
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod error;
pub mod harness;
pub mod transport;
pub mod verify;

// Re-export main types for convenience
pub use channel::{LineMatcher, Pattern};
pub use error::{Error, FailureKind};
pub use transport::{ConsoleTarget, Endpoint};
pub use verify::{
    Check, ConsoleVerifier, Outcome, SessionState, Verdict, Verifier, VerifierBuilder,
    VerifierConfig, verify,
};
