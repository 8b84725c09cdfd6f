//! # Assertion Evaluation
//!
//! Given typed assertions and a received response, produce pass/fail
//! outcomes with the observed value and a human-readable message on
//! failure.
//!
//! Evaluation never propagates an error to the caller: malformed input
//! (unparseable regex, a non-numeric operand under an ordering operator, an
//! expected value of the wrong shape for the kind) is downgraded to a
//! failed outcome carrying a descriptive message. Evaluation is pure over
//! `(assertion, response, elapsed)`, so running it twice yields identical
//! outcomes.

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Value, json};

use restprobe_types::{Assertion, AssertionKind, AssertionOutcome, ComparisonOperator, Expected};

use crate::path::PathQuery;

/// Response data as seen by the evaluator: status, headers, raw body text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HttpResponseData {
    pub status: u16,
    pub headers: IndexMap<String, String>,
    pub body: String,
}

impl HttpResponseData {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Evaluate every assertion in declared order against one response.
///
/// There is no short-circuit: all assertions always run so a report can
/// enumerate every failing check, not just the first.
pub fn evaluate_assertions(
    assertions: &[Assertion],
    response: &HttpResponseData,
    elapsed_ms: u64,
    path_query: &dyn PathQuery,
) -> Vec<AssertionOutcome> {
    assertions
        .iter()
        .map(|assertion| evaluate_one(assertion, response, elapsed_ms, path_query))
        .collect()
}

fn evaluate_one(assertion: &Assertion, response: &HttpResponseData, elapsed_ms: u64, path_query: &dyn PathQuery) -> AssertionOutcome {
    match assertion.kind {
        AssertionKind::StatusCode => compare_against_scalar(assertion, json!(response.status)),
        AssertionKind::ResponseTime => compare_against_scalar(assertion, json!(elapsed_ms)),
        AssertionKind::BodyLength => compare_against_scalar(assertion, json!(response.body.len())),
        AssertionKind::BodyContains => check_body_substring(assertion, response, true),
        AssertionKind::BodyNotContains => check_body_substring(assertion, response, false),
        AssertionKind::BodyRegex => check_body_regex(assertion, response),
        AssertionKind::IsJson => check_is_json(assertion, response),
        AssertionKind::HeaderExists => check_header_exists(assertion, response),
        AssertionKind::HeaderValue => check_header_value(assertion, response),
        AssertionKind::BodyJsonPath => check_json_path(assertion, response, path_query),
    }
}

/// Extract the plain-scalar expected value for kinds that require one.
fn scalar_expected(assertion: &Assertion) -> Result<Value, String> {
    match &assertion.expected {
        Expected::Scalar(value) => Ok(value.clone()),
        Expected::JsonPath { .. } => Err(format!("{} expects a scalar expected value, got a {{path, value}} shape", assertion.kind)),
        Expected::Header { .. } => Err(format!("{} expects a scalar expected value, got a {{name, value}} shape", assertion.kind)),
    }
}

/// Kinds whose observed value is a plain scalar compared via the operator.
fn compare_against_scalar(assertion: &Assertion, actual: Value) -> AssertionOutcome {
    let expected = match scalar_expected(assertion) {
        Ok(value) => value,
        Err(message) => return AssertionOutcome::fail(assertion, Some(actual), message),
    };
    finish_comparison(assertion, actual, expected)
}

fn check_body_substring(assertion: &Assertion, response: &HttpResponseData, want_present: bool) -> AssertionOutcome {
    let needle = match scalar_expected(assertion) {
        Ok(value) => render(&value),
        Err(message) => return AssertionOutcome::fail(assertion, None, message),
    };
    let present = response.body.contains(&needle);
    if present == want_present {
        AssertionOutcome::pass(assertion, json!(present))
    } else {
        let message = if want_present {
            format!("body does not contain '{needle}'")
        } else {
            format!("body contains '{needle}' but should not")
        };
        AssertionOutcome::fail(assertion, Some(json!(present)), message)
    }
}

fn check_body_regex(assertion: &Assertion, response: &HttpResponseData) -> AssertionOutcome {
    let pattern = match scalar_expected(assertion) {
        Ok(value) => render(&value),
        Err(message) => return AssertionOutcome::fail(assertion, None, message),
    };
    let compiled = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(err) => return AssertionOutcome::fail(assertion, None, format!("invalid regex '{pattern}': {err}")),
    };
    match compiled.find(&response.body) {
        Some(found) => AssertionOutcome::pass(assertion, json!(found.as_str())),
        None => AssertionOutcome::fail(assertion, None, format!("body does not match pattern '{pattern}'")),
    }
}

fn check_is_json(assertion: &Assertion, response: &HttpResponseData) -> AssertionOutcome {
    match serde_json::from_str::<Value>(&response.body) {
        Ok(_) => AssertionOutcome::pass(assertion, json!(true)),
        Err(err) => AssertionOutcome::fail(assertion, Some(json!(false)), format!("body is not valid JSON: {err}")),
    }
}

fn check_header_exists(assertion: &Assertion, response: &HttpResponseData) -> AssertionOutcome {
    // Accept either a plain scalar header name or the {name} shape.
    let name = match &assertion.expected {
        Expected::Header { name, .. } => name.clone(),
        Expected::Scalar(value) => render(value),
        Expected::JsonPath { .. } => {
            return AssertionOutcome::fail(assertion, None, "header_exists expects a header name, not a {path, value} shape");
        }
    };
    match response.header(&name) {
        Some(value) => AssertionOutcome::pass(assertion, json!(value)),
        None => AssertionOutcome::fail(assertion, None, format!("header '{name}' not present")),
    }
}

fn check_header_value(assertion: &Assertion, response: &HttpResponseData) -> AssertionOutcome {
    let (name, expected) = match &assertion.expected {
        Expected::Header { name, value: Some(value) } => (name.clone(), value.clone()),
        Expected::Header { name, value: None } => {
            return AssertionOutcome::fail(assertion, None, format!("header_value assertion for '{name}' requires a value"));
        }
        _ => {
            return AssertionOutcome::fail(assertion, None, "header_value expects a {name, value} shape");
        }
    };
    match response.header(&name) {
        Some(observed) => finish_comparison(assertion, json!(observed), expected),
        None => AssertionOutcome::fail(assertion, None, format!("header '{name}' not present")),
    }
}

fn check_json_path(assertion: &Assertion, response: &HttpResponseData, path_query: &dyn PathQuery) -> AssertionOutcome {
    let (path, expected) = match &assertion.expected {
        Expected::JsonPath { path, value } => (path.clone(), value.clone()),
        _ => {
            return AssertionOutcome::fail(assertion, None, "body_json_path expects a {path, value} shape");
        }
    };

    let document = match serde_json::from_str::<Value>(&response.body) {
        Ok(parsed) => parsed,
        Err(err) => return AssertionOutcome::fail(assertion, None, format!("body is not valid JSON: {err}")),
    };

    let resolved = match path_query.query(&document, &path) {
        Ok(resolved) => resolved,
        Err(err) => return AssertionOutcome::fail(assertion, None, err.to_string()),
    };

    match (resolved, expected) {
        (None, _) => AssertionOutcome::fail(assertion, None, format!("path '{path}' did not resolve")),
        // Path-exists mode: any non-null value passes.
        (Some(found), None) => {
            if found.is_null() {
                AssertionOutcome::fail(assertion, Some(found), format!("path '{path}' resolved to null"))
            } else {
                AssertionOutcome::pass(assertion, found)
            }
        }
        (Some(found), Some(expected)) => finish_comparison(assertion, found, expected),
    }
}

/// Apply the assertion's operator and build the outcome, converting any
/// comparison error into a failed outcome.
fn finish_comparison(assertion: &Assertion, actual: Value, expected: Value) -> AssertionOutcome {
    match compare(&actual, assertion.operator, &expected) {
        Ok(true) => AssertionOutcome::pass(assertion, actual),
        Ok(false) => {
            let message = format!(
                "expected {} {} {}, got {}",
                assertion.kind,
                assertion.operator.symbol(),
                render(&expected),
                render(&actual)
            );
            AssertionOutcome::fail(assertion, Some(actual), message)
        }
        Err(message) => AssertionOutcome::fail(assertion, Some(actual), message),
    }
}

/// Generic comparison over `actual`/`expected`.
///
/// `equals`/`not_equals` use JSON value equality with no coercion; the
/// ordering operators coerce both sides to f64 (numeric strings allowed);
/// `contains` does substring containment on string renderings; `regex`
/// anchors the expected pattern as a prefix match against the rendering of
/// `actual`. Errors are returned as messages, never panics.
pub fn compare(actual: &Value, operator: ComparisonOperator, expected: &Value) -> Result<bool, String> {
    match operator {
        ComparisonOperator::Equals => Ok(actual == expected),
        ComparisonOperator::NotEquals => Ok(actual != expected),
        ComparisonOperator::GreaterThan => numeric(actual, expected).map(|(a, b)| a > b),
        ComparisonOperator::LessThan => numeric(actual, expected).map(|(a, b)| a < b),
        ComparisonOperator::GreaterOrEqual => numeric(actual, expected).map(|(a, b)| a >= b),
        ComparisonOperator::LessOrEqual => numeric(actual, expected).map(|(a, b)| a <= b),
        ComparisonOperator::Contains => Ok(render(actual).contains(&render(expected))),
        ComparisonOperator::Regex => {
            let pattern = format!("^(?:{})", render(expected));
            let compiled = Regex::new(&pattern).map_err(|err| format!("invalid regex '{}': {err}", render(expected)))?;
            Ok(compiled.is_match(&render(actual)))
        }
    }
}

fn numeric(actual: &Value, expected: &Value) -> Result<(f64, f64), String> {
    Ok((coerce_f64(actual)?, coerce_f64(expected)?))
}

fn coerce_f64(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(number) => number.as_f64().ok_or_else(|| format!("'{number}' is not representable as f64")),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{text}' is not numeric; ordering comparison failed")),
        other => Err(format!("'{}' is not numeric; ordering comparison failed", render(other))),
    }
}

/// String rendering used by `contains`/`regex` and failure messages:
/// strings render without quotes, everything else as compact JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{DottedPathQuery, StructuredPathQuery};
    use restprobe_types::Expected;

    fn assertion(kind: AssertionKind, expected: Expected, operator: ComparisonOperator) -> Assertion {
        Assertion {
            kind,
            expected,
            operator,
            description: None,
        }
    }

    fn response(status: u16, body: &str) -> HttpResponseData {
        HttpResponseData {
            status,
            headers: IndexMap::from_iter([
                ("Content-Type".to_string(), "application/json".to_string()),
                ("X-Request-Id".to_string(), "abc-123".to_string()),
            ]),
            body: body.to_string(),
        }
    }

    fn evaluate(assertion: &Assertion, response: &HttpResponseData, elapsed_ms: u64) -> AssertionOutcome {
        evaluate_one(assertion, response, elapsed_ms, &StructuredPathQuery)
    }

    #[test]
    fn status_code_equals_passes_on_exact_match() {
        let a = assertion(AssertionKind::StatusCode, Expected::Scalar(json!(200)), ComparisonOperator::Equals);
        let outcome = evaluate(&a, &response(200, "{\"ok\":true}"), 5);
        assert!(outcome.passed);
        assert_eq!(outcome.actual, Some(json!(200)));
    }

    #[test]
    fn status_code_equals_fails_with_actual_captured() {
        let a = assertion(AssertionKind::StatusCode, Expected::Scalar(json!(200)), ComparisonOperator::Equals);
        let outcome = evaluate(&a, &response(503, "oops"), 5);
        assert!(!outcome.passed);
        assert_eq!(outcome.actual, Some(json!(503)));
        assert!(outcome.error.as_deref().unwrap_or_default().contains("503"));
    }

    #[test]
    fn equals_does_not_coerce_types() {
        // "200" (string) != 200 (number) under equals.
        let a = assertion(AssertionKind::StatusCode, Expected::Scalar(json!("200")), ComparisonOperator::Equals);
        let outcome = evaluate(&a, &response(200, ""), 1);
        assert!(!outcome.passed);
    }

    #[test]
    fn response_time_ordering_uses_elapsed() {
        let a = assertion(AssertionKind::ResponseTime, Expected::Scalar(json!(100)), ComparisonOperator::LessThan);
        assert!(evaluate(&a, &response(200, ""), 42).passed);
        assert!(!evaluate(&a, &response(200, ""), 250).passed);
    }

    #[test]
    fn ordering_with_non_numeric_operand_fails_without_panicking() {
        let a = assertion(AssertionKind::StatusCode, Expected::Scalar(json!("fast")), ComparisonOperator::GreaterThan);
        let outcome = evaluate(&a, &response(200, ""), 1);
        assert!(!outcome.passed);
        assert!(outcome.error.as_deref().unwrap_or_default().contains("not numeric"));
    }

    #[test]
    fn body_contains_and_not_contains() {
        let contains = assertion(
            AssertionKind::BodyContains,
            Expected::Scalar(json!("\"ok\":true")),
            ComparisonOperator::Contains,
        );
        assert!(evaluate(&contains, &response(200, "{\"ok\":true}"), 1).passed);

        let absent = assertion(
            AssertionKind::BodyNotContains,
            Expected::Scalar(json!("error")),
            ComparisonOperator::Contains,
        );
        assert!(evaluate(&absent, &response(200, "{\"ok\":true}"), 1).passed);
        assert!(!evaluate(&absent, &response(200, "{\"error\":1}"), 1).passed);
    }

    #[test]
    fn body_regex_invalid_pattern_is_a_failed_outcome() {
        let a = assertion(AssertionKind::BodyRegex, Expected::Scalar(json!("([unclosed")), ComparisonOperator::Regex);
        let outcome = evaluate(&a, &response(200, "anything"), 1);
        assert!(!outcome.passed);
        assert!(outcome.error.as_deref().unwrap_or_default().contains("invalid regex"));
    }

    #[test]
    fn body_regex_captures_matched_text() {
        let a = assertion(AssertionKind::BodyRegex, Expected::Scalar(json!(r"id-\d+")), ComparisonOperator::Regex);
        let outcome = evaluate(&a, &response(200, "user id-9931 created"), 1);
        assert!(outcome.passed);
        assert_eq!(outcome.actual, Some(json!("id-9931")));
    }

    #[test]
    fn is_json_passes_iff_body_parses() {
        let a = assertion(AssertionKind::IsJson, Expected::Scalar(json!(true)), ComparisonOperator::Equals);
        assert!(evaluate(&a, &response(200, "{\"n\": 1}"), 1).passed);
        assert!(!evaluate(&a, &response(200, "<html>"), 1).passed);
    }

    #[test]
    fn body_length_counts_bytes() {
        let a = assertion(AssertionKind::BodyLength, Expected::Scalar(json!(5)), ComparisonOperator::Equals);
        let outcome = evaluate(&a, &response(200, "hello"), 1);
        assert!(outcome.passed);
        assert_eq!(outcome.actual, Some(json!(5)));
    }

    #[test]
    fn header_exists_is_case_insensitive() {
        let a = assertion(
            AssertionKind::HeaderExists,
            Expected::Scalar(json!("content-type")),
            ComparisonOperator::Equals,
        );
        let outcome = evaluate(&a, &response(200, ""), 1);
        assert!(outcome.passed);
        assert_eq!(outcome.actual, Some(json!("application/json")));
    }

    #[test]
    fn header_value_compares_via_operator() {
        let a = assertion(
            AssertionKind::HeaderValue,
            Expected::Header {
                name: "content-type".into(),
                value: Some(json!("json")),
            },
            ComparisonOperator::Contains,
        );
        assert!(evaluate(&a, &response(200, ""), 1).passed);

        let missing = assertion(
            AssertionKind::HeaderValue,
            Expected::Header {
                name: "x-absent".into(),
                value: Some(json!("v")),
            },
            ComparisonOperator::Equals,
        );
        let outcome = evaluate(&missing, &response(200, ""), 1);
        assert!(!outcome.passed);
        assert!(outcome.error.as_deref().unwrap_or_default().contains("not present"));
    }

    #[test]
    fn json_path_equals_passes_and_fails_with_actual() {
        let a = assertion(
            AssertionKind::BodyJsonPath,
            Expected::JsonPath {
                path: "$.user.id".into(),
                value: Some(json!(42)),
            },
            ComparisonOperator::Equals,
        );
        assert!(evaluate(&a, &response(200, "{\"user\":{\"id\":42}}"), 1).passed);

        let outcome = evaluate(&a, &response(200, "{\"user\":{\"id\":43}}"), 1);
        assert!(!outcome.passed);
        assert_eq!(outcome.actual, Some(json!(43)));
    }

    #[test]
    fn json_path_exists_mode_passes_on_any_non_null() {
        let a = assertion(
            AssertionKind::BodyJsonPath,
            Expected::JsonPath {
                path: "$.user.name".into(),
                value: None,
            },
            ComparisonOperator::Equals,
        );
        assert!(evaluate(&a, &response(200, "{\"user\":{\"name\":\"ada\"}}"), 1).passed);
        assert!(evaluate(&a, &response(200, "{\"user\":{\"name\":0}}"), 1).passed);

        let null_outcome = evaluate(&a, &response(200, "{\"user\":{\"name\":null}}"), 1);
        assert!(!null_outcome.passed);
        let missing_outcome = evaluate(&a, &response(200, "{\"user\":{}}"), 1);
        assert!(!missing_outcome.passed);
    }

    #[test]
    fn json_path_on_non_json_body_fails_gracefully() {
        let a = assertion(
            AssertionKind::BodyJsonPath,
            Expected::JsonPath {
                path: "$.id".into(),
                value: None,
            },
            ComparisonOperator::Equals,
        );
        let outcome = evaluate(&a, &response(200, "not json"), 1);
        assert!(!outcome.passed);
        assert!(outcome.error.as_deref().unwrap_or_default().contains("not valid JSON"));
    }

    #[test]
    fn json_path_fallback_reports_unsupported_depth() {
        let a = assertion(
            AssertionKind::BodyJsonPath,
            Expected::JsonPath {
                path: "$.a.b.c".into(),
                value: None,
            },
            ComparisonOperator::Equals,
        );
        let outcome = evaluate_one(&a, &response(200, "{\"a\":{\"b\":{\"c\":1}}}"), 1, &DottedPathQuery);
        assert!(!outcome.passed);
        assert!(outcome.error.as_deref().unwrap_or_default().contains("at most two"));
    }

    #[test]
    fn regex_operator_anchors_prefix_match() {
        let a = assertion(
            AssertionKind::HeaderValue,
            Expected::Header {
                name: "x-request-id".into(),
                value: Some(json!(r"abc-\d+")),
            },
            ComparisonOperator::Regex,
        );
        assert!(evaluate(&a, &response(200, ""), 1).passed);

        // Pattern matching the middle only should fail the anchored match.
        let middle = assertion(
            AssertionKind::HeaderValue,
            Expected::Header {
                name: "x-request-id".into(),
                value: Some(json!(r"\d+")),
            },
            ComparisonOperator::Regex,
        );
        assert!(!evaluate(&middle, &response(200, ""), 1).passed);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let a = assertion(AssertionKind::StatusCode, Expected::Scalar(json!(404)), ComparisonOperator::Equals);
        let r = response(404, "");
        let first = evaluate(&a, &r, 7);
        let second = evaluate(&a, &r, 7);
        assert_eq!(first, second);
    }

    #[test]
    fn all_assertions_run_in_declared_order() {
        let assertions = vec![
            assertion(AssertionKind::StatusCode, Expected::Scalar(json!(500)), ComparisonOperator::Equals),
            assertion(AssertionKind::BodyContains, Expected::Scalar(json!("ok")), ComparisonOperator::Contains),
            assertion(AssertionKind::StatusCode, Expected::Scalar(json!(200)), ComparisonOperator::Equals),
        ];
        let outcomes = evaluate_assertions(&assertions, &response(200, "{\"ok\":true}"), 1, &StructuredPathQuery);
        assert_eq!(outcomes.len(), 3);
        assert!(!outcomes[0].passed);
        assert!(outcomes[1].passed);
        assert!(outcomes[2].passed);
    }
}
