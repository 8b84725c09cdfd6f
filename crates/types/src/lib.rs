//! Shared type definitions for the restprobe test-execution engine.
//!
//! Everything in this crate is plain data: request definitions, the
//! assertion grammar, per-test results, and aggregated reports. The engine
//! crate owns all behavior; collection files deserialize directly into
//! these types via serde.

use indexmap::IndexMap;

pub mod assertion;
pub mod request;
pub mod result;

pub use assertion::{Assertion, AssertionKind, AssertionOutcome, ComparisonOperator, Expected};
pub use request::{HttpMethod, ParseMethodError, RequestBody, RequestDefinition};
pub use result::{ResponseSnapshot, RunResult, SuiteReport, SuiteSpec, TestCaseSpec, TestResult, TestStatus};

/// Flat name→value mapping used for variable substitution.
///
/// Resolved once per run and shared read-only across every test case in
/// that run. Insertion order is preserved so data-driven merges are
/// deterministic.
pub type Environment = IndexMap<String, String>;
