//! Ordered batches of checks.

use std::fmt;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::verify::{Check, Verdict, Verifier};

/// Checks run one after another over the same console.
///
/// A failed check does not abort the batch unless `stop_on_failure` is set.
#[derive(Debug, Clone, Default)]
pub struct CheckSuite {
    checks: IndexMap<String, Check>,
    stop_on_failure: bool,
}

impl CheckSuite {
    /// Create an empty suite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a check. A check with the same name replaces the earlier one
    /// but keeps its position.
    pub fn with_check(mut self, check: Check) -> Self {
        self.checks.insert(check.name.clone(), check);
        self
    }

    /// Stop at the first failing check; later checks are reported as skipped.
    pub fn stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    /// Get a check by name.
    pub fn get(&self, name: &str) -> Option<&Check> {
        self.checks.get(name)
    }

    /// Iterate over checks in run order.
    pub fn iter(&self) -> impl Iterator<Item = &Check> {
        self.checks.values()
    }

    /// Number of checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Check if the suite has no checks.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check in order.
    pub async fn run<V: Verifier>(&self, verifier: &V) -> SuiteReport {
        let mut report = SuiteReport::default();

        for (name, check) in &self.checks {
            if report.stopped {
                report.skipped.push(name.clone());
                continue;
            }

            let verdict = verifier.check(check).await;
            if verdict.passed() {
                debug!("check '{}' passed", name);
            } else {
                warn!("check '{}' failed: {}", name, verdict);
                report.stopped = self.stop_on_failure;
            }
            report.results.insert(name.clone(), verdict);
        }

        report
    }
}

/// Verdicts of a suite run, in run order.
#[derive(Debug, Default)]
pub struct SuiteReport {
    /// Verdict per check name.
    pub results: IndexMap<String, Verdict>,

    /// Checks not run because an earlier one failed.
    pub skipped: Vec<String>,

    stopped: bool,
}

impl SuiteReport {
    /// Check if every check ran and passed.
    pub fn passed(&self) -> bool {
        self.skipped.is_empty() && self.results.values().all(Verdict::passed)
    }

    /// Get the verdict of a check.
    pub fn get(&self, name: &str) -> Option<&Verdict> {
        self.results.get(name)
    }

    /// Names and verdicts of failed checks.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Verdict)> {
        self.results
            .iter()
            .filter(|(_, v)| !v.passed())
            .map(|(name, v)| (name.as_str(), v))
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, verdict) in &self.results {
            writeln!(f, "{}: {}", name, verdict)?;
        }
        for name in &self.skipped {
            writeln!(f, "{}: SKIPPED", name)?;
        }
        Ok(())
    }
}
