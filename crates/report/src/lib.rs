//! Report rendering for restprobe runs.
//!
//! Three output formats are supported: a human-readable console summary, a
//! lossless JSON record for downstream tooling, and JUnit-style XML for CI
//! systems. Formats are always rendered before the process exit code is
//! acted upon, so a failing run still produces its reports.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use thiserror::Error;

use restprobe_types::RunResult;

pub mod console;
pub mod junit;
pub mod record;

pub use console::render_console;
pub use junit::render_junit;
pub use record::render_record;

/// Output format selector as it appears on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Console,
    Json,
    Junit,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Console => "cli",
            Self::Json => "json",
            Self::Junit => "junit",
        }
    }
}

/// Error returned for an unrecognized report format selector.
#[derive(Debug, Error)]
#[error("unknown report format '{0}'; expected one of: cli, json, junit")]
pub struct ParseFormatError(pub String);

impl FromStr for ReportFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cli" | "console" => Ok(Self::Console),
            "json" => Ok(Self::Json),
            "junit" | "xml" => Ok(Self::Junit),
            other => Err(ParseFormatError(other.to_string())),
        }
    }
}

/// Process exit code for a finished run: 0 iff nothing failed or errored,
/// or when suppression is requested for informational-only CI runs.
pub fn exit_code(run: &RunResult, suppress: bool) -> i32 {
    if suppress || run.passed() { 0 } else { 1 }
}

/// Write a rendered report to a file, creating parent directories.
pub fn write_report(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create report directory {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("write report file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(failed: usize, errors: usize) -> RunResult {
        RunResult {
            iterations: 1,
            total: failed + errors + 1,
            passed: 1,
            failed,
            errors,
            pass_rate: 50.0,
            duration_ms: 10,
            avg_response_time_ms: 5.0,
            tests: vec![],
        }
    }

    #[test]
    fn format_parses_known_selectors() {
        assert_eq!("cli".parse::<ReportFormat>().unwrap(), ReportFormat::Console);
        assert_eq!("JUnit".parse::<ReportFormat>().unwrap(), ReportFormat::Junit);
        assert_eq!("json".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("tap".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn exit_code_reflects_failures_and_suppression() {
        assert_eq!(exit_code(&run(0, 0), false), 0);
        assert_eq!(exit_code(&run(1, 0), false), 1);
        assert_eq!(exit_code(&run(0, 1), false), 1);
        assert_eq!(exit_code(&run(2, 1), true), 0);
    }
}
