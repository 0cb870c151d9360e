//! Setup, check, teardown.

use log::{debug, warn};

use super::container::Container;
use super::fixture::MountFixture;
use super::suite::{CheckSuite, SuiteReport};
use super::ConfigMutation;
use crate::error::{Error, HarnessError, Result};
use crate::verify::Verifier;

/// A suite of checks with the environment it needs.
///
/// Running a scenario:
/// 1. Applies config mutations in order
/// 2. Starts the container
/// 3. Runs the check suite
/// 4. Tears down the container, reverts mutations in reverse order and
///    removes the fixture
///
/// A setup failure undoes what was already set up and returns an error
/// without running any check. Teardown failures are logged.
pub struct Scenario {
    name: String,
    fixture: Option<MountFixture>,
    mutations: Vec<Box<dyn ConfigMutation>>,
    container: Option<Container>,
    suite: CheckSuite,
}

impl Scenario {
    /// Create an empty scenario.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixture: None,
            mutations: Vec::new(),
            container: None,
            suite: CheckSuite::new(),
        }
    }

    /// Keep `fixture` alive for the run and remove it afterwards.
    pub fn with_fixture(mut self, fixture: MountFixture) -> Self {
        self.fixture = Some(fixture);
        self
    }

    /// Add a config mutation.
    pub fn with_mutation(mut self, mutation: Box<dyn ConfigMutation>) -> Self {
        self.mutations.push(mutation);
        self
    }

    /// Set the container to start before the checks.
    pub fn with_container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    /// Set the checks to run.
    pub fn with_suite(mut self, suite: CheckSuite) -> Self {
        self.suite = suite;
        self
    }

    /// Get the scenario name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the fixture, if any.
    pub fn fixture(&self) -> Option<&MountFixture> {
        self.fixture.as_ref()
    }

    /// Get the check suite.
    pub fn suite(&self) -> &CheckSuite {
        &self.suite
    }

    /// Run the scenario against `verifier`.
    pub async fn run<V: Verifier>(mut self, verifier: &V) -> Result<SuiteReport> {
        let outcome = self.execute(verifier).await;

        if let Some(fixture) = self.fixture.take() {
            if let Err(e) = fixture.close() {
                warn!("removing fixture failed: {}", e);
            }
        }

        outcome
    }

    async fn execute<V: Verifier>(&self, verifier: &V) -> Result<SuiteReport> {
        debug!("scenario '{}': setup", self.name);

        let mut applied = 0;
        for mutation in &self.mutations {
            if let Err(e) = mutation.apply().await {
                self.teardown(applied, false).await;
                return Err(setup_failed(mutation.name(), e));
            }
            applied += 1;
        }

        if let Some(container) = &self.container {
            if let Err(e) = container.start().await {
                // A failed start can leave a half-created container behind.
                self.teardown(applied, true).await;
                let step = format!("start container {}", container.spec().id);
                return Err(setup_failed(&step, e));
            }
        }

        debug!("scenario '{}': running {} checks", self.name, self.suite.len());
        let report = self.suite.run(verifier).await;

        self.teardown(applied, true).await;
        Ok(report)
    }

    async fn teardown(&self, applied: usize, container_started: bool) {
        debug!("scenario '{}': teardown", self.name);

        if container_started {
            if let Some(container) = &self.container {
                container.teardown().await;
            }
        }

        for mutation in self.mutations[..applied].iter().rev() {
            if let Err(e) = mutation.revert().await {
                warn!("reverting '{}' failed: {}", mutation.name(), e);
            }
        }
    }
}

fn setup_failed(step: &str, error: Error) -> Error {
    HarnessError::SetupFailed {
        step: step.to_string(),
        message: error.to_string(),
    }
    .into()
}
