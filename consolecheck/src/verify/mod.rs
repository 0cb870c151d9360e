//! High-level verifier for console checks.
//!
//! The verify layer composes the transport and channel layers into a single
//! bounded check: connect, send a command, race the response matcher
//! against a deadline, close, and report a [`Verdict`].

mod builder;
mod check;
mod config;
pub mod governor;
mod session;
mod verdict;
mod verifier;

pub use builder::VerifierBuilder;
pub use check::Check;
pub use config::VerifierConfig;
pub use session::SessionState;
pub use verdict::{Outcome, Verdict};
pub use verifier::ConsoleVerifier;

use std::future::Future;
use std::path::PathBuf;

use log::warn;

/// Trait for anything that can run a check and report a verdict.
pub trait Verifier: Send + Sync {
    /// Send `command` and wait for a response line containing `pattern`.
    fn verify(&self, command: &str, pattern: &str) -> impl Future<Output = Verdict> + Send;

    /// Run a named check.
    fn check(&self, check: &Check) -> impl Future<Output = Verdict> + Send {
        async move { self.verify(&check.command, &check.pattern).await }
    }
}

impl Verifier for ConsoleVerifier {
    fn verify(&self, command: &str, pattern: &str) -> impl Future<Output = Verdict> + Send {
        ConsoleVerifier::verify(self, command, pattern)
    }
}

/// Verify a command against the console at `socket` with default settings.
///
/// Returns `true` only if a response line contains `pattern` before the
/// default deadline. The failure cause is logged.
///
/// ```rust,no_run
/// # async fn example() {
/// let ok = consolecheck::verify(
///     "/run/vc/vm/sandbox/console.sock",
///     "ls /run/kata-containers/shared/containers/sandbox-mounts/test-mount/\n",
///     "test-file",
/// )
/// .await;
/// # }
/// ```
pub async fn verify(socket: impl Into<PathBuf>, command: &str, pattern: &str) -> bool {
    let verifier = match VerifierBuilder::unix(socket).build() {
        Ok(verifier) => verifier,
        Err(e) => {
            warn!("invalid console target: {}", e);
            return false;
        }
    };

    let verdict = verifier.verify(command, pattern).await;
    if let Some(cause) = verdict.cause() {
        warn!("check {:?} failed: {}", command.trim_end(), cause);
    }
    verdict.passed()
}
