//! Collection, environment, and data-file loading.
//!
//! All loaders are strict: an unreadable file, an unknown extension, or a
//! malformed document aborts the run before any request is issued.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use restprobe_types::{Environment, SuiteSpec};

/// Load a collection file, dispatching on extension (`.yaml`/`.yml`/`.json`).
pub fn load_suite(path: &Path) -> Result<SuiteSpec> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read collection file {}", path.display()))?;
    let spec: SuiteSpec = match extension(path) {
        "yaml" | "yml" => {
            serde_yaml::from_str(&raw).with_context(|| format!("parse YAML collection {}", path.display()))?
        }
        "json" => serde_json::from_str(&raw).with_context(|| format!("parse JSON collection {}", path.display()))?,
        other => bail!("unsupported collection extension '{other}'; expected yaml, yml, or json"),
    };
    if spec.tests.is_empty() {
        bail!("collection '{}' declares no tests", spec.name);
    }
    Ok(spec)
}

/// Load an environment overlay file: a flat map of variable names to
/// scalar values. Scalars are coerced to strings; nested values are
/// rejected.
pub fn load_environment(path: &Path) -> Result<Environment> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read environment file {}", path.display()))?;
    let value: Value = match extension(path) {
        "yaml" | "yml" => {
            serde_yaml::from_str(&raw).with_context(|| format!("parse YAML environment {}", path.display()))?
        }
        "json" => serde_json::from_str(&raw).with_context(|| format!("parse JSON environment {}", path.display()))?,
        other => bail!("unsupported environment extension '{other}'; expected yaml, yml, or json"),
    };
    let Value::Object(entries) = value else {
        bail!("environment file {} must be a flat object", path.display());
    };
    let mut environment = Environment::new();
    for (name, value) in entries {
        environment.insert(name.clone(), scalar_to_string(&value).with_context(|| format!("environment variable '{name}'"))?);
    }
    Ok(environment)
}

/// Load a data file driving one iteration per row: either a JSON array of
/// flat objects or a CSV file with a header row.
pub fn load_data(path: &Path) -> Result<Vec<Environment>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read data file {}", path.display()))?;
    let rows = match extension(path) {
        "json" => json_rows(&raw).with_context(|| format!("parse JSON data file {}", path.display()))?,
        "csv" => csv_rows(&raw).with_context(|| format!("parse CSV data file {}", path.display()))?,
        other => bail!("unsupported data extension '{other}'; expected json or csv"),
    };
    if rows.is_empty() {
        bail!("data file {} has no rows", path.display());
    }
    Ok(rows)
}

fn json_rows(raw: &str) -> Result<Vec<Environment>> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(items) = value else {
        bail!("expected a top-level array of objects");
    };
    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Value::Object(entries) = item else {
            bail!("row {index} is not an object");
        };
        let mut row = Environment::new();
        for (name, value) in entries {
            row.insert(name.clone(), scalar_to_string(value).with_context(|| format!("row {index}, column '{name}'"))?);
        }
        rows.push(row);
    }
    Ok(rows)
}

// Deliberately minimal: comma-separated, no quoting or escaping. Rows with
// a column count differing from the header are rejected.
fn csv_rows(raw: &str) -> Result<Vec<Environment>> {
    let mut lines = raw.lines().filter(|line| !line.trim().is_empty());
    let Some(header) = lines.next() else {
        bail!("missing header row");
    };
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let mut rows = Vec::new();
    for (index, line) in lines.enumerate() {
        let values: Vec<&str> = line.split(',').map(str::trim).collect();
        if values.len() != columns.len() {
            bail!("row {} has {} values, header has {} columns", index + 1, values.len(), columns.len());
        }
        let row = columns
            .iter()
            .zip(&values)
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn scalar_to_string(value: &Value) -> Result<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => bail!("nested values are not allowed"),
    }
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|ext| ext.to_str()).unwrap_or("")
}
