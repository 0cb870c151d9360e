//! Test doubles for harness components.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::ProcessRunner;
use crate::channel::MatchReport;
use crate::error::{ChannelError, HarnessError, Result};
use crate::verify::{SessionState, Verdict, Verifier};

/// Records every invocation as a single command line.
#[derive(Default)]
pub(crate) struct RecordingRunner {
    calls: Mutex<Vec<String>>,
    fail_program: Option<String>,
}

impl RecordingRunner {
    pub(crate) fn failing_on(program: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_program: Some(program.to_string()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<()> {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.calls.lock().unwrap().push(line);

        if self.fail_program.as_deref() == Some(program) {
            return Err(HarnessError::SetupFailed {
                step: program.to_string(),
                message: "scripted failure".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Editor stand-in that writes to the file on each call and fails once
/// `succeed` calls have been made.
pub(crate) struct EditingRunner {
    file: PathBuf,
    succeed: usize,
    calls: AtomicUsize,
}

impl EditingRunner {
    pub(crate) fn new(file: &Path, succeed: usize) -> Self {
        Self {
            file: file.to_path_buf(),
            succeed,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessRunner for EditingRunner {
    async fn run(&self, program: &str, _args: &[String]) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.succeed {
            return Err(HarnessError::SetupFailed {
                step: program.to_string(),
                message: "scripted failure".to_string(),
            }
            .into());
        }
        std::fs::write(&self.file, "edited").map_err(HarnessError::Fixture)?;
        Ok(())
    }
}

/// Verifier answering from a queue of pass/fail results.
pub(crate) struct ScriptedVerifier {
    results: Mutex<VecDeque<bool>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedVerifier {
    pub(crate) fn new(results: &[bool]) -> Self {
        Self {
            results: Mutex::new(results.iter().copied().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    fn next(&self, command: &str, pattern: &str) -> Verdict {
        self.seen.lock().unwrap().push(command.to_string());
        let pass = self.results.lock().unwrap().pop_front().unwrap_or(false);
        let states = vec![SessionState::Reading, SessionState::Closed];
        if pass {
            Verdict::matched(
                command.to_string(),
                pattern.to_string(),
                MatchReport {
                    line: pattern.to_string(),
                    lines_read: 3,
                },
                Duration::from_millis(1),
                states,
            )
        } else {
            Verdict::failed(
                command.to_string(),
                pattern.to_string(),
                ChannelError::Timeout(Duration::from_secs(1)).into(),
                0,
                Duration::from_secs(1),
                states,
            )
        }
    }
}

impl Verifier for ScriptedVerifier {
    fn verify(
        &self,
        command: &str,
        pattern: &str,
    ) -> impl std::future::Future<Output = Verdict> + Send {
        let verdict = self.next(command, pattern);
        async move { verdict }
    }
}
