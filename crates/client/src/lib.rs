//! HTTP client utilities for the restprobe engine.
//!
//! This crate provides a lightweight wrapper around `reqwest` focused on:
//!
//! - Constructing an HTTP client with sensible defaults (timeout, gzip)
//! - Applying base headers shared by every call in a run
//! - Validating target URLs before a request is built
//! - Building requests with a consistent User-Agent
//!
//! The primary entry point is [`ProbeClient`]. Create an instance via
//! [`ProbeClient::new`], and then build requests with
//! [`ProbeClient::request`]. The client holds no per-call state; each call
//! is independent and the connection pool is shared read-only.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Method, RequestBuilder, Url, header};
use tracing::debug;

/// Schemes a test target may use. Anything else is a configuration error.
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Thin wrapper around a configured `reqwest::Client` for issuing test
/// requests.
///
/// The per-call timeout is baked into the underlying client so every
/// dispatched request carries it; a timeout surfaces as a transport error
/// on `send`, which the executor maps to an errored test case.
#[derive(Debug, Clone)]
pub struct ProbeClient {
    http: Client,
    user_agent: String,
}

impl ProbeClient {
    /// Construct a [`ProbeClient`] with the given per-request timeout and
    /// base headers applied to every call.
    pub fn new(timeout: Duration, base_headers: &[(String, String)]) -> Result<Self> {
        let mut default_headers = header::HeaderMap::new();
        for (name, value) in base_headers {
            let header_name = header::HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("invalid base header name '{name}'"))?;
            let header_value = header::HeaderValue::from_str(value)
                .with_context(|| format!("invalid base header value for '{name}'"))?;
            default_headers.insert(header_name, header_value);
        }

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .context("build http client")?;

        Ok(Self {
            http,
            user_agent: format!("restprobe/0.1; {}", env::consts::OS),
        })
    }

    /// Build a `reqwest::RequestBuilder` for a method and absolute URL.
    ///
    /// The URL must already have variables resolved; it is validated before
    /// the builder is created.
    pub fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        validate_target_url(url)?;
        debug!(%url, %method, "building request");

        Ok(self
            .http
            .request(method, url)
            .header(header::USER_AGENT, &self.user_agent))
    }
}

/// Validate that a resolved target URL is acceptable for dispatch.
///
/// Rules: the URL must parse, must include a host, and must use http or
/// https. Unresolved `{{name}}` placeholders fail the parse and produce a
/// clear message here rather than a confusing transport error later.
pub fn validate_target_url(url: &str) -> Result<()> {
    if url.contains("{{") {
        return Err(anyhow!("URL '{url}' still contains unresolved variables"));
    }

    let parsed = Url::parse(url).map_err(|e| anyhow!("invalid target URL '{url}': {e}"))?;

    parsed
        .host_str()
        .ok_or_else(|| anyhow!("target URL '{url}' must include a host"))?;

    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(anyhow!(
            "target URL '{url}' uses scheme '{}'; only http and https are supported",
            parsed.scheme()
        ));
    }

    Ok(())
}
