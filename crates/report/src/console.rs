//! Human-readable console summary.

use restprobe_types::{RunResult, TestStatus};

/// Max width of an error excerpt in a per-test row.
const ERROR_EXCERPT_CHARS: usize = 120;

/// Render the run summary, and in verbose mode one row per test plus
/// per-assertion detail for anything that did not pass.
pub fn render_console(run: &RunResult, verbose: bool) -> String {
    let mut out = String::new();

    out.push_str("run summary\n");
    out.push_str("-----------\n");
    out.push_str(&format!("iterations : {}\n", run.iterations));
    out.push_str(&format!("total      : {}\n", run.total));
    out.push_str(&format!("passed     : {}\n", run.passed));
    out.push_str(&format!("failed     : {}\n", run.failed));
    out.push_str(&format!("errors     : {}\n", run.errors));
    out.push_str(&format!("pass rate  : {:.1}%\n", run.pass_rate));
    out.push_str(&format!("duration   : {} ms\n", run.duration_ms));
    out.push_str(&format!("avg rtt    : {:.1} ms\n", run.avg_response_time_ms));

    if verbose {
        out.push('\n');
        for test in &run.tests {
            let marker = match test.status {
                TestStatus::Passed => "PASS ",
                TestStatus::Failed => "FAIL ",
                TestStatus::Error => "ERROR",
                TestStatus::Pending | TestStatus::Running => "     ",
            };
            out.push_str(&format!("{marker} {} ({} ms)", test.name, test.response_time_ms));
            if let Some(error) = &test.error {
                out.push_str(&format!(" - {}", excerpt(error)));
            }
            out.push('\n');

            for assertion in test.assertions.iter().filter(|a| !a.passed) {
                let label = assertion.description.clone().unwrap_or_else(|| assertion.kind.to_string());
                let detail = assertion.error.as_deref().unwrap_or("assertion failed");
                out.push_str(&format!("      x {label}: {}\n", excerpt(detail)));
            }
        }
    }

    out
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= ERROR_EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let truncated: String = trimmed.chars().take(ERROR_EXCERPT_CHARS.saturating_sub(3)).collect();
    format!("{}...", truncated.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use restprobe_types::TestResult;

    fn test_result(name: &str, status: TestStatus, error: Option<&str>) -> TestResult {
        let now = Utc::now();
        TestResult {
            name: name.into(),
            status,
            response_time_ms: 12,
            started_at: now,
            completed_at: now,
            response: None,
            error: error.map(Into::into),
            assertions: vec![],
        }
    }

    fn sample_run() -> RunResult {
        RunResult {
            iterations: 1,
            total: 2,
            passed: 1,
            failed: 0,
            errors: 1,
            pass_rate: 50.0,
            duration_ms: 40,
            avg_response_time_ms: 12.0,
            tests: vec![
                test_result("health", TestStatus::Passed, None),
                test_result("users", TestStatus::Error, Some("network error: connection refused")),
            ],
        }
    }

    #[test]
    fn summary_contains_counts_and_rate() {
        let rendered = render_console(&sample_run(), false);
        assert!(rendered.contains("total      : 2"));
        assert!(rendered.contains("pass rate  : 50.0%"));
        assert!(!rendered.contains("health"));
    }

    #[test]
    fn verbose_lists_each_test_with_status() {
        let rendered = render_console(&sample_run(), true);
        assert!(rendered.contains("PASS  health (12 ms)"));
        assert!(rendered.contains("ERROR users (12 ms) - network error: connection refused"));
    }

    #[test]
    fn long_errors_are_excerpted() {
        let long = "e".repeat(500);
        let rendered = render_console(
            &RunResult {
                tests: vec![test_result("t", TestStatus::Error, Some(&long))],
                ..sample_run()
            },
            true,
        );
        assert!(rendered.contains("..."));
        assert!(!rendered.contains(&long));
    }
}
