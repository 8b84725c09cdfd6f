//! # Test Case Execution
//!
//! Owns one request definition plus its assertions: resolves variables,
//! performs the HTTP call through the dispatcher, runs every assertion in
//! declared order, and produces a structured [`TestResult`].
//!
//! Exactly one HTTP request is issued per execution; retry is an
//! orchestrator concern. Nothing here mutates shared state, and nothing
//! below this layer lets an error escape as a panic or an `Err` — every
//! failure mode lands in the result record.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, warn};

use restprobe_types::{Environment, RequestBody, RequestDefinition, ResponseSnapshot, TestCaseSpec, TestResult, TestStatus};

use crate::assertion::{HttpResponseData, evaluate_assertions};
use crate::dispatch::{HttpDispatcher, PreparedRequest};
use crate::path::PathQuery;
use crate::resolve::{resolve_template, resolve_value};

/// Cap applied to response bodies stored in result snapshots so reports
/// cannot grow without bound.
pub const MAX_SNAPSHOT_BODY_BYTES: usize = 8 * 1024;

/// Setup hook: runs before the request with the resolved environment.
/// A failure aborts the case with state `Error`.
pub type SetupHook = Arc<dyn Fn(&Environment) -> anyhow::Result<()> + Send + Sync>;

/// Teardown hook: runs after the request with the environment and the
/// response snapshot when one exists. Failures are logged, never fatal.
pub type TeardownHook = Arc<dyn Fn(&Environment, Option<&ResponseSnapshot>) -> anyhow::Result<()> + Send + Sync>;

/// One executable test case: a declarative spec plus optional hook
/// callbacks supplied by the caller at construction time.
///
/// Hooks are a narrow callback interface by design — test data never
/// carries executable content.
#[derive(Clone)]
pub struct TestCase {
    pub spec: TestCaseSpec,
    pub setup: Option<SetupHook>,
    pub teardown: Option<TeardownHook>,
}

impl TestCase {
    pub fn new(spec: TestCaseSpec) -> Self {
        Self {
            spec,
            setup: None,
            teardown: None,
        }
    }

    pub fn with_setup(mut self, hook: SetupHook) -> Self {
        self.setup = Some(hook);
        self
    }

    pub fn with_teardown(mut self, hook: TeardownHook) -> Self {
        self.teardown = Some(hook);
        self
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("spec", &self.spec)
            .field("setup", &self.setup.is_some())
            .field("teardown", &self.teardown.is_some())
            .finish()
    }
}

/// Resolve a request definition's URL, headers, query parameters, and body
/// against the environment, yielding the request actually dispatched.
pub fn prepare_request(request: &RequestDefinition, environment: &Environment) -> PreparedRequest {
    let headers = request
        .headers
        .iter()
        .map(|(name, value)| (name.clone(), resolve_template(value, environment)))
        .collect();
    let query = request
        .query
        .iter()
        .map(|(name, value)| (name.clone(), resolve_template(value, environment)))
        .collect();
    let body = request.body.as_ref().map(|body| match body {
        RequestBody::Raw(text) => RequestBody::Raw(resolve_template(text, environment)),
        RequestBody::Json(value) => RequestBody::Json(resolve_value(value, environment)),
    });

    PreparedRequest {
        method: request.method,
        url: resolve_template(&request.url, environment),
        headers,
        query,
        body,
    }
}

/// Execute one test case against the environment.
///
/// The per-call timeout travels with the dispatcher; a timed-out or
/// otherwise failed transport maps to state `Error` with no assertions
/// evaluated. A completed call maps to `Passed` iff every assertion holds,
/// otherwise `Failed`.
pub async fn execute_case(
    case: &TestCase,
    environment: &Environment,
    dispatcher: &dyn HttpDispatcher,
    path_query: &dyn PathQuery,
) -> TestResult {
    let name = case.spec.name.clone();
    let started_at = Utc::now();
    let timer = Instant::now();
    debug!(test = %name, "test case running");

    if let Some(setup) = &case.setup
        && let Err(err) = setup(environment)
    {
        run_teardown(case, environment, None);
        return TestResult {
            name,
            status: TestStatus::Error,
            response_time_ms: 0,
            started_at,
            completed_at: Utc::now(),
            response: None,
            error: Some(format!("setup hook failed: {err}")),
            assertions: vec![],
        };
    }

    let prepared = prepare_request(&case.spec.request, environment);
    match dispatcher.dispatch(&prepared).await {
        Ok(response) => {
            let elapsed_ms = timer.elapsed().as_millis() as u64;
            let outcomes = evaluate_assertions(&case.spec.assertions, &response, elapsed_ms, path_query);
            let status = if outcomes.iter().all(|outcome| outcome.passed) {
                TestStatus::Passed
            } else {
                TestStatus::Failed
            };
            let snapshot = snapshot_response(&response);
            run_teardown(case, environment, Some(&snapshot));
            debug!(test = %name, %status, elapsed_ms, "test case complete");
            TestResult {
                name,
                status,
                response_time_ms: elapsed_ms,
                started_at,
                completed_at: Utc::now(),
                response: Some(snapshot),
                error: None,
                assertions: outcomes,
            }
        }
        Err(err) => {
            let elapsed_ms = timer.elapsed().as_millis() as u64;
            run_teardown(case, environment, None);
            warn!(test = %name, error = %err, "test case errored");
            TestResult {
                name,
                status: TestStatus::Error,
                response_time_ms: elapsed_ms,
                started_at,
                completed_at: Utc::now(),
                response: None,
                error: Some(err.to_string()),
                assertions: vec![],
            }
        }
    }
}

/// Synthesize an errored result without dispatching, used when a suite-level
/// failure prevents a case from ever running.
pub fn errored_result(name: impl Into<String>, message: impl Into<String>) -> TestResult {
    let now = Utc::now();
    TestResult {
        name: name.into(),
        status: TestStatus::Error,
        response_time_ms: 0,
        started_at: now,
        completed_at: now,
        response: None,
        error: Some(message.into()),
        assertions: vec![],
    }
}

fn run_teardown(case: &TestCase, environment: &Environment, snapshot: Option<&ResponseSnapshot>) {
    if let Some(teardown) = &case.teardown
        && let Err(err) = teardown(environment, snapshot)
    {
        warn!(test = %case.spec.name, error = %err, "teardown hook failed; test status unchanged");
    }
}

fn snapshot_response(response: &HttpResponseData) -> ResponseSnapshot {
    let (body, body_truncated) = truncate_body(&response.body, MAX_SNAPSHOT_BODY_BYTES);
    ResponseSnapshot {
        status: response.status,
        headers: response.headers.clone(),
        body,
        body_truncated,
    }
}

/// Truncate on a char boundary at or below `max_bytes`.
fn truncate_body(body: &str, max_bytes: usize) -> (String, bool) {
    if body.len() <= max_bytes {
        return (body.to_string(), false);
    }
    let mut cut = max_bytes;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    (body[..cut].to_string(), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use indexmap::IndexMap;
    use serde_json::json;
    use std::sync::Mutex;

    use restprobe_types::{Assertion, AssertionKind, ComparisonOperator, Expected, HttpMethod};

    use crate::dispatch::{DispatchError, StaticDispatcher};
    use crate::path::StructuredPathQuery;

    struct FailingDispatcher;

    #[async_trait]
    impl HttpDispatcher for FailingDispatcher {
        async fn dispatch(&self, _request: &PreparedRequest) -> Result<HttpResponseData, DispatchError> {
            Err(DispatchError::Timeout("deadline elapsed after 5s".into()))
        }
    }

    fn environment() -> Environment {
        Environment::from_iter([("base_url".to_string(), "http://localhost:9999".to_string())])
    }

    fn health_case(expected_status: u16) -> TestCase {
        TestCase::new(TestCaseSpec {
            name: "health".into(),
            request: RequestDefinition {
                url: "{{base_url}}/health".into(),
                method: HttpMethod::Get,
                headers: IndexMap::from_iter([("x-token".to_string(), "{{token}}".to_string())]),
                query: IndexMap::new(),
                body: None,
            },
            assertions: vec![Assertion {
                kind: AssertionKind::StatusCode,
                expected: Expected::Scalar(json!(expected_status)),
                operator: ComparisonOperator::Equals,
                description: Some("health endpoint responds".into()),
            }],
        })
    }

    #[test]
    fn prepare_request_resolves_all_parts() {
        let mut env = environment();
        env.insert("token".into(), "t-1".into());
        let case = health_case(200);
        let prepared = prepare_request(&case.spec.request, &env);
        assert_eq!(prepared.url, "http://localhost:9999/health");
        assert_eq!(prepared.headers["x-token"], "t-1");
    }

    #[tokio::test]
    async fn passing_case_reports_passed_with_actual() {
        let dispatcher = StaticDispatcher::new(200, "{\"ok\":true}");
        let result = execute_case(&health_case(200), &environment(), &dispatcher, &StructuredPathQuery).await;
        assert_eq!(result.status, TestStatus::Passed);
        assert_eq!(result.assertions.len(), 1);
        assert_eq!(result.assertions[0].actual, Some(json!(200)));
        assert_eq!(result.response.as_ref().unwrap().status, 200);
    }

    #[tokio::test]
    async fn failing_assertion_reports_failed_not_error() {
        let dispatcher = StaticDispatcher::new(503, "unavailable");
        let result = execute_case(&health_case(200), &environment(), &dispatcher, &StructuredPathQuery).await;
        assert_eq!(result.status, TestStatus::Failed);
        assert_eq!(result.assertions[0].actual, Some(json!(503)));
        assert!(!result.assertions[0].passed);
    }

    #[tokio::test]
    async fn timeout_maps_to_error_with_no_assertions() {
        let result = execute_case(&health_case(200), &environment(), &FailingDispatcher, &StructuredPathQuery).await;
        assert_eq!(result.status, TestStatus::Error);
        assert!(result.assertions.is_empty());
        assert!(result.response.is_none());
        assert!(result.error.as_deref().unwrap_or_default().contains("timed out"));
    }

    #[tokio::test]
    async fn setup_failure_aborts_before_dispatch() {
        let case = health_case(200).with_setup(Arc::new(|_env| anyhow::bail!("database seed unavailable")));
        // A failing dispatcher proves the request was never issued: the
        // error message comes from the hook, not the transport.
        let result = execute_case(&case, &environment(), &FailingDispatcher, &StructuredPathQuery).await;
        assert_eq!(result.status, TestStatus::Error);
        assert!(result.error.as_deref().unwrap_or_default().contains("setup hook failed"));
        assert!(result.error.as_deref().unwrap_or_default().contains("database seed unavailable"));
    }

    #[tokio::test]
    async fn teardown_failure_does_not_change_status() {
        let observed: Arc<Mutex<Option<u16>>> = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&observed);
        let case = health_case(200).with_teardown(Arc::new(move |_env, snapshot| {
            *sink.lock().unwrap() = snapshot.map(|s| s.status);
            anyhow::bail!("cleanup script exploded")
        }));
        let dispatcher = StaticDispatcher::new(200, "{}");
        let result = execute_case(&case, &environment(), &dispatcher, &StructuredPathQuery).await;
        assert_eq!(result.status, TestStatus::Passed);
        assert_eq!(*observed.lock().unwrap(), Some(200));
    }

    #[tokio::test]
    async fn oversized_body_is_truncated_in_snapshot() {
        let big_body = "x".repeat(MAX_SNAPSHOT_BODY_BYTES + 100);
        let dispatcher = StaticDispatcher::new(200, big_body);
        let mut case = health_case(200);
        case.spec.assertions.clear();
        let result = execute_case(&case, &environment(), &dispatcher, &StructuredPathQuery).await;
        let snapshot = result.response.expect("snapshot");
        assert_eq!(snapshot.body.len(), MAX_SNAPSHOT_BODY_BYTES);
        assert!(snapshot.body_truncated);
    }

    #[tokio::test]
    async fn case_with_no_assertions_passes_when_call_succeeds() {
        let dispatcher = StaticDispatcher::new(204, "");
        let mut case = health_case(200);
        case.spec.assertions.clear();
        let result = execute_case(&case, &environment(), &dispatcher, &StructuredPathQuery).await;
        assert_eq!(result.status, TestStatus::Passed);
    }
}
