//! Container lifecycle through a containerd-style CLI.

use std::sync::Arc;

use log::{debug, warn};

use super::ProcessRunner;
use crate::error::Result;

/// What to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Container and task id.
    pub id: String,

    /// Image reference.
    pub image: String,

    /// Runtime handler, e.g. `io.containerd.kata.v2`.
    pub runtime: String,

    /// Command run inside the container.
    pub command: Vec<String>,
}

impl ContainerSpec {
    /// Create a spec running `sh` in `image`.
    pub fn new(
        id: impl Into<String>,
        image: impl Into<String>,
        runtime: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            image: image.into(),
            runtime: runtime.into(),
            command: vec!["sh".to_string()],
        }
    }
}

/// A detached container started and torn down with `ctr`.
pub struct Container {
    spec: ContainerSpec,
    cli: String,
    runner: Arc<dyn ProcessRunner>,
}

impl Container {
    /// Create a handle; nothing is started yet.
    pub fn new(spec: ContainerSpec, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            spec,
            cli: "ctr".to_string(),
            runner,
        }
    }

    /// Use a different CLI program (default: `ctr`).
    pub fn with_cli(mut self, cli: impl Into<String>) -> Self {
        self.cli = cli.into();
        self
    }

    /// Get the spec.
    pub fn spec(&self) -> &ContainerSpec {
        &self.spec
    }

    /// Start the container detached.
    pub async fn start(&self) -> Result<()> {
        debug!("starting container {}", self.spec.id);
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--runtime".to_string(),
            self.spec.runtime.clone(),
            "-d".to_string(),
            self.spec.image.clone(),
            self.spec.id.clone(),
        ];
        args.extend(self.spec.command.iter().cloned());
        self.runner.run(&self.cli, &args).await
    }

    /// Kill and delete the task, then delete the container.
    ///
    /// Every step is attempted even if an earlier one fails; failures are
    /// logged and counted.
    pub async fn teardown(&self) -> usize {
        let id = self.spec.id.as_str();
        let steps: [&[&str]; 3] = [
            &["task", "kill", id],
            &["task", "delete", id],
            &["container", "delete", id],
        ];

        let mut failures = 0;
        for step in steps {
            let args: Vec<String> = step.iter().map(|a| a.to_string()).collect();
            if let Err(e) = self.runner.run(&self.cli, &args).await {
                warn!("teardown of {}: '{} {}' failed: {}", id, self.cli, args.join(" "), e);
                failures += 1;
            }
        }
        failures
    }
}
