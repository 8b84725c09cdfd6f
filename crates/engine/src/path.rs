//! Structured-path extraction from JSON documents.
//!
//! `body_json_path` assertions resolve a path expression like `$.user.id`
//! against the parsed response body. The capability is modeled as a trait
//! with two implementations selected when the engine is constructed, not
//! probed per call:
//!
//! - [`StructuredPathQuery`]: full dotted traversal with `name[index]`
//!   array access at any depth. This is the default.
//! - [`DottedPathQuery`]: the manual fallback; supports one- and two-level
//!   dotted key access only. Deeper or indexed paths return
//!   [`PathError::UnsupportedDepth`] rather than silently miscomputing.

use serde_json::Value;
use thiserror::Error;

/// Error raised while resolving a path expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The expression was empty after stripping the `$` prefix.
    #[error("empty path expression")]
    Empty,
    /// A bracketed segment did not contain a usable array index.
    #[error("invalid array index '{0}' in path expression")]
    InvalidIndex(String),
    /// The fallback resolver saw a path deeper than it supports.
    #[error("path '{path}' has {depth} segments; dotted fallback supports at most two")]
    UnsupportedDepth { path: String, depth: usize },
}

/// Capability interface for resolving a path expression against a JSON
/// document. `Ok(None)` means the path is well-formed but absent.
pub trait PathQuery: Send + Sync {
    fn query(&self, root: &Value, path: &str) -> Result<Option<Value>, PathError>;
}

/// Full structured-path engine: `$.a.b`, `items[0].id`, arbitrary depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredPathQuery;

impl PathQuery for StructuredPathQuery {
    fn query(&self, root: &Value, path: &str) -> Result<Option<Value>, PathError> {
        let stripped = strip_root(path);
        if stripped.is_empty() {
            return Ok(Some(root.clone()));
        }

        let mut current = root;
        for segment in split_segments(stripped) {
            if let Some((name, index)) = parse_array_access(&segment) {
                if !name.is_empty() {
                    match current.get(name) {
                        Some(next) => current = next,
                        None => return Ok(None),
                    }
                }
                let parsed_index: usize = index.parse().map_err(|_| PathError::InvalidIndex(index.to_string()))?;
                match current.get(parsed_index) {
                    Some(next) => current = next,
                    None => return Ok(None),
                }
            } else {
                match current.get(segment.as_str()) {
                    Some(next) => current = next,
                    None => return Ok(None),
                }
            }
        }
        Ok(Some(current.clone()))
    }
}

/// Manual dotted-key fallback used when the full engine is unavailable.
///
/// Walks nested map lookups for `a` and `a.b` shapes only; arrays and
/// deeper nesting are out of its reach and rejected explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct DottedPathQuery;

impl PathQuery for DottedPathQuery {
    fn query(&self, root: &Value, path: &str) -> Result<Option<Value>, PathError> {
        let stripped = strip_root(path);
        if stripped.is_empty() {
            return Err(PathError::Empty);
        }

        let segments: Vec<&str> = stripped.split('.').collect();
        if segments.len() > 2 {
            return Err(PathError::UnsupportedDepth {
                path: path.to_string(),
                depth: segments.len(),
            });
        }
        if segments.iter().any(|s| s.contains('[')) {
            return Err(PathError::InvalidIndex(stripped.to_string()));
        }

        let mut current = root;
        for segment in segments {
            match current.get(segment) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current.clone()))
    }
}

/// Default capability for this runtime: the full structured engine.
pub fn default_path_query() -> StructuredPathQuery {
    StructuredPathQuery
}

fn strip_root(path: &str) -> &str {
    let trimmed = path.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);
    trimmed.strip_prefix('.').unwrap_or(trimmed)
}

/// Split a path into segments, keeping bracketed indexes attached to their
/// field name.
fn split_segments(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_bracket = false;

    for ch in path.chars() {
        match ch {
            '.' if !in_bracket => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            '[' => {
                in_bracket = true;
                current.push(ch);
            }
            ']' => {
                in_bracket = false;
                current.push(ch);
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Parse `field[3]` into `("field", "3")`; bare segments return `None`.
fn parse_array_access(segment: &str) -> Option<(&str, &str)> {
    let bracket_start = segment.find('[')?;
    if !segment.ends_with(']') {
        return None;
    }
    let name = &segment[..bracket_start];
    let index = &segment[bracket_start + 1..segment.len() - 1];
    Some((name, index))
}
