//! # Suite Coordination
//!
//! Runs an ordered collection of test cases against one resolved
//! environment, sequentially or concurrently, and aggregates the outcomes
//! into a [`SuiteReport`].
//!
//! Sequential mode short-circuits the remaining cases after an `Error`
//! result (unreachable infrastructure makes continuing wasteful); `Failed`
//! cases never stop the suite. Concurrent mode dispatches every case and
//! lets all of them finish; reported order always matches declaration
//! order regardless of completion order.

use std::time::Instant;

use futures_util::future::join_all;
use tracing::{debug, warn};

use restprobe_types::{Environment, SuiteReport, SuiteSpec, TestStatus};

use crate::dispatch::HttpDispatcher;
use crate::executor::{SetupHook, TestCase, errored_result, execute_case};
use crate::path::PathQuery;

/// An ordered group of test cases sharing one environment, with optional
/// suite-level setup/teardown hooks that run once per invocation.
#[derive(Clone)]
pub struct TestSuite {
    pub name: String,
    pub environment: Environment,
    pub cases: Vec<TestCase>,
    pub setup: Option<SetupHook>,
    pub teardown: Option<SetupHook>,
}

impl TestSuite {
    /// Wrap a declarative suite spec; hooks can be attached afterwards.
    pub fn from_spec(spec: SuiteSpec) -> Self {
        Self {
            name: spec.name,
            environment: spec.environment,
            cases: spec.tests.into_iter().map(TestCase::new).collect(),
            setup: None,
            teardown: None,
        }
    }

    pub fn with_setup(mut self, hook: SetupHook) -> Self {
        self.setup = Some(hook);
        self
    }

    pub fn with_teardown(mut self, hook: SetupHook) -> Self {
        self.teardown = Some(hook);
        self
    }
}

/// Run every case in the suite against the given resolved environment.
///
/// The environment is shared read-only across all cases; no case can
/// mutate it for a sibling. Suite setup failure marks every case `Error`
/// without dispatching a single request; suite teardown failure is logged
/// and leaves the report untouched.
pub async fn run_suite(
    suite: &TestSuite,
    environment: &Environment,
    dispatcher: &dyn HttpDispatcher,
    path_query: &dyn PathQuery,
    parallel: bool,
) -> SuiteReport {
    let timer = Instant::now();
    debug!(suite = %suite.name, cases = suite.cases.len(), parallel, "suite starting");

    if let Some(setup) = &suite.setup
        && let Err(err) = setup(environment)
    {
        warn!(suite = %suite.name, error = %err, "suite setup failed; marking all cases errored");
        let results = suite
            .cases
            .iter()
            .map(|case| errored_result(&case.spec.name, format!("suite setup failed: {err}")))
            .collect();
        return SuiteReport::from_results(&suite.name, results, timer.elapsed().as_millis() as u64);
    }

    let results = if parallel {
        run_parallel(suite, environment, dispatcher, path_query).await
    } else {
        run_sequential(suite, environment, dispatcher, path_query).await
    };

    if let Some(teardown) = &suite.teardown
        && let Err(err) = teardown(environment)
    {
        warn!(suite = %suite.name, error = %err, "suite teardown failed; report unchanged");
    }

    SuiteReport::from_results(&suite.name, results, timer.elapsed().as_millis() as u64)
}

async fn run_sequential(
    suite: &TestSuite,
    environment: &Environment,
    dispatcher: &dyn HttpDispatcher,
    path_query: &dyn PathQuery,
) -> Vec<restprobe_types::TestResult> {
    let mut results = Vec::with_capacity(suite.cases.len());
    for (index, case) in suite.cases.iter().enumerate() {
        let result = execute_case(case, environment, dispatcher, path_query).await;
        let errored = result.status == TestStatus::Error;
        results.push(result);
        if errored {
            let remaining = suite.cases.len() - index - 1;
            if remaining > 0 {
                warn!(suite = %suite.name, remaining, "case errored; remaining cases not dispatched");
            }
            break;
        }
    }
    results
}

/// Dispatch every case concurrently against the same read-only environment
/// and await all outcomes. `join_all` preserves input order, so the report
/// stays deterministic no matter which request completes first. No sibling
/// is cancelled by another's failure.
async fn run_parallel(
    suite: &TestSuite,
    environment: &Environment,
    dispatcher: &dyn HttpDispatcher,
    path_query: &dyn PathQuery,
) -> Vec<restprobe_types::TestResult> {
    let executions = suite
        .cases
        .iter()
        .map(|case| execute_case(case, environment, dispatcher, path_query));
    join_all(executions).await
}
