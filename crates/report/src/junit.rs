//! JUnit-compatible XML rendering for CI systems.
//!
//! One `testsuite` element holds one `testcase` per test. Failed cases
//! nest a `failure` element with a message attribute, errored cases nest
//! an `error` element, passed cases nest neither. The aggregate attributes
//! on `testsuites`/`testsuite` match the run summary exactly, and elapsed
//! times are rendered in seconds with three decimal places.

use std::fmt::Write as _;

use restprobe_types::{RunResult, TestResult, TestStatus};

/// Render the run as a JUnit XML document.
pub fn render_junit(run: &RunResult, suite_name: &str) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        xml,
        "<testsuites tests=\"{}\" failures=\"{}\" errors=\"{}\" time=\"{}\">",
        run.total,
        run.failed,
        run.errors,
        seconds(run.duration_ms)
    );
    let _ = writeln!(
        xml,
        "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"{}\" time=\"{}\">",
        escape(suite_name),
        run.total,
        run.failed,
        run.errors,
        seconds(run.duration_ms)
    );

    for test in &run.tests {
        render_case(&mut xml, test);
    }

    xml.push_str("  </testsuite>\n");
    xml.push_str("</testsuites>\n");
    xml
}

fn render_case(xml: &mut String, test: &TestResult) {
    let name = escape(&test.name);
    let time = seconds(test.response_time_ms);
    match test.status {
        TestStatus::Failed => {
            let _ = writeln!(xml, "    <testcase name=\"{name}\" time=\"{time}\">");
            let _ = writeln!(xml, "      <failure message=\"{}\"/>", escape(&failure_message(test)));
            xml.push_str("    </testcase>\n");
        }
        TestStatus::Error => {
            let message = test.error.as_deref().unwrap_or("execution error");
            let _ = writeln!(xml, "    <testcase name=\"{name}\" time=\"{time}\">");
            let _ = writeln!(xml, "      <error message=\"{}\"/>", escape(message));
            xml.push_str("    </testcase>\n");
        }
        _ => {
            let _ = writeln!(xml, "    <testcase name=\"{name}\" time=\"{time}\"/>");
        }
    }
}

/// Join every failing assertion's message so the CI view shows the full
/// picture, not just the first failure.
fn failure_message(test: &TestResult) -> String {
    let messages: Vec<&str> = test
        .assertions
        .iter()
        .filter(|outcome| !outcome.passed)
        .filter_map(|outcome| outcome.error.as_deref())
        .collect();
    if messages.is_empty() {
        "assertion failed".to_string()
    } else {
        messages.join("; ")
    }
}

fn seconds(ms: u64) -> String {
    format!("{:.3}", ms as f64 / 1000.0)
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
