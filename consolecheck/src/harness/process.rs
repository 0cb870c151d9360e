//! Process runner backed by tokio's process support.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use super::ProcessRunner;
use crate::error::{HarnessError, Result};

/// Runs programs on the local system.
///
/// Stdout is discarded, stderr is captured for error reports. With a
/// timeout set, a program that runs too long is killed.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    /// Create a runner without a timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill programs that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<()> {
        debug!("exec: {} {}", program, args.join(" "));

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| HarnessError::ProcessTimeout {
                    program: program.to_string(),
                    timeout,
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|source| HarnessError::Spawn {
            program: program.to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(HarnessError::ProcessFailed {
                program: program.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        Ok(())
    }
}
