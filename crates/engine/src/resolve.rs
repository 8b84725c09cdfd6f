//! # Variable Resolution
//!
//! Substitutes `{{name}}`-style placeholders in strings and arbitrarily
//! nested JSON values using a flat environment mapping.
//!
//! Resolution is literal key lookup only; there is no expression
//! evaluation. A placeholder whose name is absent from the environment is
//! left unchanged (identity substitution, not an error), so a report can
//! show the unresolved token verbatim. Both functions are pure: the same
//! inputs always produce the same output and nothing is mutated.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use restprobe_types::Environment;

// Cached to avoid recompilation in hot paths.
static TEMPLATE_VAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").expect("template pattern compiles"));

/// Replace every `{{name}}` token in `input` with the corresponding
/// environment value, leaving unknown names verbatim.
pub fn resolve_template(input: &str, environment: &Environment) -> String {
    TEMPLATE_VAR_RE
        .replace_all(input, |caps: &Captures<'_>| match environment.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Recursively resolve placeholders in a JSON value.
///
/// Strings are substituted, arrays and objects are walked element by
/// element, and every other value is returned structurally unchanged.
pub fn resolve_value(value: &Value, environment: &Environment) -> Value {
    match value {
        Value::String(text) => Value::String(resolve_template(text, environment)),
        Value::Array(items) => Value::Array(items.iter().map(|item| resolve_value(item, environment)).collect()),
        Value::Object(map) => {
            let mut resolved = serde_json::Map::new();
            for (key, nested) in map {
                resolved.insert(key.clone(), resolve_value(nested, environment));
            }
            Value::Object(resolved)
        }
        _ => value.clone(),
    }
}
