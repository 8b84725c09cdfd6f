//! Request definitions consumed read-only by the test case executor.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// HTTP method for a request definition.
///
/// Serializes to the canonical uppercase wire name; deserialization accepts
/// any case so collection files may write `get` or `GET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Canonical uppercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized HTTP method name.
#[derive(Debug, Error)]
#[error("unsupported HTTP method: '{0}'")]
pub struct ParseMethodError(pub String);

impl FromStr for HttpMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            other => Err(ParseMethodError(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Body payload attached to a request definition.
///
/// Collection files may provide either a raw string or structured JSON;
/// strings deserialize as [`RequestBody::Raw`], everything else as
/// [`RequestBody::Json`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    /// Raw text body sent verbatim.
    Raw(String),
    /// JSON body, subject to recursive variable resolution.
    Json(Value),
}

/// Immutable description of one HTTP request to issue.
///
/// Produced by an external collection-import or discovery agent and
/// consumed read-only by the executor. The URL, header values, query
/// values, and body may all contain `{{name}}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDefinition {
    /// Target URL template, e.g. `{{base_url}}/users/{{user_id}}`.
    pub url: String,
    /// HTTP method; defaults to GET.
    #[serde(default)]
    pub method: HttpMethod,
    /// Header name→value map, order preserved.
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Query parameter name→value map, order preserved.
    #[serde(default)]
    pub query: IndexMap<String, String>,
    /// Optional request body.
    #[serde(default)]
    pub body: Option<RequestBody>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("DELETE".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!("FETCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn method_deserializes_in_any_case() {
        let lower: HttpMethod = serde_json::from_value(json!("post")).unwrap();
        assert_eq!(lower, HttpMethod::Post);
        let upper: HttpMethod = serde_json::from_value(json!("POST")).unwrap();
        assert_eq!(upper, HttpMethod::Post);
        assert_eq!(serde_json::to_value(HttpMethod::Post).unwrap(), json!("POST"));
    }

    #[test]
    fn request_definition_deserializes_with_defaults() {
        let def: RequestDefinition = serde_json::from_value(json!({
            "url": "https://api.example.com/health"
        }))
        .expect("deserialize");
        assert_eq!(def.method, HttpMethod::Get);
        assert!(def.headers.is_empty());
        assert!(def.body.is_none());
    }

    #[test]
    fn body_distinguishes_raw_from_json() {
        let raw: RequestBody = serde_json::from_value(json!("plain text")).unwrap();
        assert_eq!(raw, RequestBody::Raw("plain text".into()));

        let structured: RequestBody = serde_json::from_value(json!({"id": 1})).unwrap();
        assert_eq!(structured, RequestBody::Json(json!({"id": 1})));
    }
}
