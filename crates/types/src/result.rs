//! Test case specifications, per-test result records, and aggregated
//! suite/run reports.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::assertion::{Assertion, AssertionOutcome};
use crate::request::RequestDefinition;

/// Lifecycle state of a test case.
///
/// `Pending → Running → {Passed | Failed | Error}`. `Error` means the HTTP
/// call itself could not complete (network failure, timeout, hook failure)
/// and is distinct from `Failed`, which means the call completed but at
/// least one assertion did not hold. Skip decisions happen before execution
/// and leave a case at `Pending`; there is no skipped terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    #[default]
    Pending,
    Running,
    Passed,
    Failed,
    Error,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded snapshot of the HTTP response kept in a test result.
///
/// The body is capped by the executor so reports cannot grow without bound;
/// `body_truncated` records that the cap was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub body_truncated: bool,
}

/// Structured record of one executed test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub status: TestStatus,
    pub response_time_ms: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Truncated response snapshot; absent when the call never completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseSnapshot>,
    /// Execution-error message for `Error` results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Per-assertion outcomes in declared order; empty when the call errored
    /// before evaluation.
    #[serde(default)]
    pub assertions: Vec<AssertionOutcome>,
}

/// Declarative test case as it appears in a collection file: one request
/// plus its ordered assertions. Hooks are attached by the engine at
/// construction time and never deserialized from data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseSpec {
    pub name: String,
    pub request: RequestDefinition,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
}

/// Collection-file shape for one suite: a name, a base environment, and an
/// ordered list of test cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteSpec {
    pub name: String,
    #[serde(default)]
    pub environment: IndexMap<String, String>,
    #[serde(default)]
    pub tests: Vec<TestCaseSpec>,
}

/// Aggregated report for one suite invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub name: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    /// Percentage of passed cases over total; 0.0 for an empty suite.
    pub pass_rate: f64,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl SuiteReport {
    /// Build a report from ordered results, computing the counts.
    pub fn from_results(name: impl Into<String>, results: Vec<TestResult>, duration_ms: u64) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.status == TestStatus::Passed).count();
        let failed = results.iter().filter(|r| r.status == TestStatus::Failed).count();
        let errors = results.iter().filter(|r| r.status == TestStatus::Error).count();
        Self {
            name: name.into(),
            total,
            passed,
            failed,
            errors,
            pass_rate: pass_rate(passed, total),
            duration_ms,
            results,
        }
    }
}

/// Final aggregate across all iterations of a run, handed to the report
/// generator. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub iterations: usize,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub pass_rate: f64,
    pub duration_ms: u64,
    pub avg_response_time_ms: f64,
    pub tests: Vec<TestResult>,
}

impl RunResult {
    /// Merge iteration reports by summing counts and concatenating per-test
    /// records, recomputing the pass rate and mean response time over the
    /// merged set.
    pub fn from_reports(reports: Vec<SuiteReport>) -> Self {
        let iterations = reports.len();
        let mut total = 0;
        let mut passed = 0;
        let mut failed = 0;
        let mut errors = 0;
        let mut duration_ms = 0;
        let mut tests = Vec::new();
        for report in reports {
            total += report.total;
            passed += report.passed;
            failed += report.failed;
            errors += report.errors;
            duration_ms += report.duration_ms;
            tests.extend(report.results);
        }
        let avg_response_time_ms = if tests.is_empty() {
            0.0
        } else {
            tests.iter().map(|t| t.response_time_ms as f64).sum::<f64>() / tests.len() as f64
        };
        Self {
            iterations,
            total,
            passed,
            failed,
            errors,
            pass_rate: pass_rate(passed, total),
            duration_ms,
            avg_response_time_ms,
            tests,
        }
    }

    /// True when no case failed or errored.
    pub fn passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

fn pass_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}
