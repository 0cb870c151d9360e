//! Orchestration harness around console checks.
//!
//! Prepares the environment a check runs against (config file edits, mount
//! fixtures, container lifecycle), runs a suite of checks, and restores the
//! environment afterwards. External tools are only reached through the
//! [`ProcessRunner`] trait, and config changes through [`ConfigMutation`].

mod backup;
mod container;
mod fixture;
mod mutation;
pub mod presets;
mod process;
mod scenario;
mod suite;

#[cfg(test)]
pub(crate) mod test_support;

pub use backup::ConfigBackup;
pub use container::{Container, ContainerSpec};
pub use fixture::MountFixture;
pub use mutation::{IniEdit, IniSetting};
pub use process::SystemRunner;
pub use scenario::Scenario;
pub use suite::{CheckSuite, SuiteReport};

use async_trait::async_trait;

use crate::error::Result;

/// Trait for running external programs.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args` to completion.
    ///
    /// A non-zero exit status is an error.
    async fn run(&self, program: &str, args: &[String]) -> Result<()>;
}

/// A reversible change to the environment's configuration.
#[async_trait]
pub trait ConfigMutation: Send + Sync {
    /// Short name used in logs and setup errors.
    fn name(&self) -> &str;

    /// Apply the change.
    ///
    /// On error nothing of the change may remain; `revert` is only called
    /// after a successful `apply`.
    async fn apply(&self) -> Result<()>;

    /// Undo the change.
    async fn revert(&self) -> Result<()>;
}
