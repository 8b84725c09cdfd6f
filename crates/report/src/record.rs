//! Machine-readable JSON record of a run.
//!
//! The record is a structurally complete dump of the in-memory
//! [`RunResult`]: every count, every per-test record, every per-assertion
//! outcome. Downstream tooling can reconstruct the run from it.

use serde_json::{Value, json};

use restprobe_types::RunResult;

/// Render the `{summary, tests}` record as pretty-printed JSON.
pub fn render_record(run: &RunResult) -> String {
    let value = record_value(run);
    // Serialization of an already-built Value cannot fail.
    serde_json::to_string_pretty(&value).unwrap_or_default()
}

/// Build the record as a JSON value.
pub fn record_value(run: &RunResult) -> Value {
    json!({
        "summary": {
            "iterations": run.iterations,
            "total": run.total,
            "passed": run.passed,
            "failed": run.failed,
            "errors": run.errors,
            "pass_rate": run.pass_rate,
            "duration_ms": run.duration_ms,
            "avg_response_time_ms": run.avg_response_time_ms,
        },
        "tests": run.tests,
    })
}
