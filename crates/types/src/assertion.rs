//! Assertion grammar: the typed checks a test case declares against a
//! response, and the outcome records produced when they are evaluated.
//!
//! An [`Assertion`] is an immutable specification. Evaluation never mutates
//! it; each run produces a fresh [`AssertionOutcome`], so outcome state can
//! never leak between runs.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The dimension of the response an assertion inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionKind {
    /// Numeric HTTP status code.
    StatusCode,
    /// Elapsed wall-clock time in milliseconds.
    ResponseTime,
    /// Substring present in the raw body text.
    BodyContains,
    /// Substring absent from the raw body text.
    BodyNotContains,
    /// Value extracted from the JSON body via a structured path.
    BodyJsonPath,
    /// Case-insensitive header presence.
    HeaderExists,
    /// Header value compared via the operator.
    HeaderValue,
    /// Compiled-pattern search against the raw body.
    BodyRegex,
    /// Body parses as JSON at all.
    IsJson,
    /// Byte length of the body.
    BodyLength,
}

impl AssertionKind {
    /// Wire name used in report records (`snake_case`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StatusCode => "status_code",
            Self::ResponseTime => "response_time",
            Self::BodyContains => "body_contains",
            Self::BodyNotContains => "body_not_contains",
            Self::BodyJsonPath => "body_json_path",
            Self::HeaderExists => "header_exists",
            Self::HeaderValue => "header_value",
            Self::BodyRegex => "body_regex",
            Self::IsJson => "is_json",
            Self::BodyLength => "body_length",
        }
    }
}

impl fmt::Display for AssertionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied between the observed and expected values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    #[default]
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Contains,
    Regex,
}

impl ComparisonOperator {
    /// Wire name used in report records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::GreaterOrEqual => "greater_or_equal",
            Self::LessOrEqual => "less_or_equal",
            Self::Contains => "contains",
            Self::Regex => "regex",
        }
    }

    /// Short symbol used in failure messages.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
            Self::Contains => "contains",
            Self::Regex => "matches",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected value of an assertion.
///
/// Modeled as a tagged union rather than an untyped field so each kind's
/// evaluator receives a statically known shape: `body_json_path` takes
/// [`Expected::JsonPath`], `header_value`/`header_exists` take
/// [`Expected::Header`], everything else takes [`Expected::Scalar`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expected {
    /// `{path, value}` shape; `value` omitted means "path exists" mode.
    JsonPath {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
    /// `{name, value}` shape for header assertions.
    Header {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
    /// Plain scalar (number, string, bool).
    Scalar(Value),
}

/// One declared check against one dimension of an HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    /// What to inspect.
    #[serde(rename = "type")]
    pub kind: AssertionKind,
    /// Expected value; shape depends on `kind`.
    pub expected: Expected,
    /// Comparison operator; defaults to `equals`.
    #[serde(default)]
    pub operator: ComparisonOperator,
    /// Human-readable description for reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Result of evaluating one assertion, produced fresh per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionOutcome {
    #[serde(rename = "type")]
    pub kind: AssertionKind,
    pub operator: ComparisonOperator,
    pub expected: Expected,
    /// Observed value, when one could be extracted.
    pub actual: Option<Value>,
    pub passed: bool,
    /// Human-readable failure or evaluation-error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AssertionOutcome {
    /// Passing outcome with the observed value captured.
    pub fn pass(assertion: &Assertion, actual: Value) -> Self {
        Self {
            kind: assertion.kind,
            operator: assertion.operator,
            expected: assertion.expected.clone(),
            actual: Some(actual),
            passed: true,
            error: None,
            description: assertion.description.clone(),
        }
    }

    /// Failing outcome with an explanatory message and the observed value
    /// when one was extracted before the check failed.
    pub fn fail(assertion: &Assertion, actual: Option<Value>, message: impl Into<String>) -> Self {
        Self {
            kind: assertion.kind,
            operator: assertion.operator,
            expected: assertion.expected.clone(),
            actual,
            passed: false,
            error: Some(message.into()),
            description: assertion.description.clone(),
        }
    }
}
