//! # Run Orchestration
//!
//! Drives N iterations of a suite — plain repeats or data-driven parameter
//! sets — applies bail semantics between iterations, and merges all
//! iteration reports into one [`RunResult`] for the report generator.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use restprobe_types::{Environment, RunResult, SuiteReport};

use crate::dispatch::HttpDispatcher;
use crate::path::PathQuery;
use crate::suite::{TestSuite, run_suite};

/// Options controlling one run of a suite.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Plain repeat count; ignored when `data` is present.
    pub iterations: usize,
    /// One parameter set per iteration, each merged over the base
    /// environment with the row's values winning on key collision.
    pub data: Option<Vec<Environment>>,
    /// Run each suite's cases concurrently instead of in order.
    pub parallel: bool,
    /// Stop issuing further iterations once one reports a failed or
    /// errored case.
    pub bail: bool,
    /// Pause between iterations; no work happens during the delay.
    pub delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            iterations: 1,
            data: None,
            parallel: false,
            bail: false,
            delay: Duration::ZERO,
        }
    }
}

/// Merge a parameter row over a base environment; row values take
/// precedence on key collision.
pub fn merge_environment(base: &Environment, row: &Environment) -> Environment {
    let mut merged = base.clone();
    for (key, value) in row {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Execute all iterations of a suite and aggregate the reports.
///
/// Bail never cancels work inside an iteration; it only prevents later
/// iterations from starting. An iteration with errored cases is treated
/// as at least as terminal as one with failed cases.
pub async fn execute_run(
    suite: &TestSuite,
    options: &RunOptions,
    dispatcher: &dyn HttpDispatcher,
    path_query: &dyn PathQuery,
) -> RunResult {
    let iteration_environments: Vec<Environment> = match &options.data {
        Some(rows) => rows.iter().map(|row| merge_environment(&suite.environment, row)).collect(),
        None => {
            let count = options.iterations.max(1);
            std::iter::repeat_with(|| suite.environment.clone()).take(count).collect()
        }
    };

    let total_iterations = iteration_environments.len();
    let mut reports: Vec<SuiteReport> = Vec::with_capacity(total_iterations);

    for (index, environment) in iteration_environments.iter().enumerate() {
        if index > 0 && !options.delay.is_zero() {
            sleep(options.delay).await;
        }
        debug!(iteration = index + 1, total_iterations, "iteration starting");

        let report = run_suite(suite, environment, dispatcher, path_query, options.parallel).await;
        let unhealthy = report.failed > 0 || report.errors > 0;
        reports.push(report);

        if options.bail && unhealthy {
            let skipped = total_iterations - index - 1;
            if skipped > 0 {
                warn!(iteration = index + 1, skipped, "bailing; later iterations not started");
            }
            break;
        }
    }

    RunResult::from_reports(reports)
}
