//! HTTP dispatch seam between the executor and the network.
//!
//! The executor talks to [`HttpDispatcher`] rather than to `reqwest`
//! directly. [`ClientDispatcher`] is the production implementation backed by
//! [`restprobe_client::ProbeClient`]; [`StaticDispatcher`] returns a canned
//! response so tests and previews run without external side effects.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::Method;
use thiserror::Error;
use tracing::debug;

use restprobe_client::ProbeClient;
use restprobe_types::{HttpMethod, RequestBody};

use crate::assertion::HttpResponseData;

/// A request definition with all variables resolved, ready to go on the
/// wire. Built once per execution by the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

/// Transport-level failure of one dispatch. Every variant maps to test
/// state `Error`; the distinction feeds the result's error message.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Issue one prepared HTTP request and return the raw response data.
///
/// Implementations must issue exactly one request per call; retry policy
/// belongs to the orchestrator, not here.
#[async_trait]
pub trait HttpDispatcher: Send + Sync {
    async fn dispatch(&self, request: &PreparedRequest) -> Result<HttpResponseData, DispatchError>;
}

/// Production dispatcher backed by a configured [`ProbeClient`]. The
/// per-call timeout travels with the client; a timeout surfaces as
/// [`DispatchError::Timeout`].
pub struct ClientDispatcher {
    client: ProbeClient,
}

impl ClientDispatcher {
    pub fn new(client: ProbeClient) -> Self {
        Self { client }
    }

    /// Convenience constructor for the common case: timeout plus no base
    /// headers.
    pub fn with_timeout(timeout: Duration) -> Result<Self, DispatchError> {
        let client = ProbeClient::new(timeout, &[]).map_err(|err| DispatchError::InvalidRequest(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpDispatcher for ClientDispatcher {
    async fn dispatch(&self, request: &PreparedRequest) -> Result<HttpResponseData, DispatchError> {
        let method = Method::from_str(request.method.as_str()).map_err(|err| DispatchError::InvalidRequest(err.to_string()))?;

        let mut builder = self
            .client
            .request(method, &request.url)
            .map_err(|err| DispatchError::InvalidRequest(err.to_string()))?;

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Raw(text)) => builder.body(text.clone()),
            None => builder,
        };

        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                DispatchError::Timeout(err.to_string())
            } else {
                DispatchError::Network(err.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let mut headers = IndexMap::new();
        for (name, value) in response.headers() {
            headers.insert(name.as_str().to_string(), value.to_str().unwrap_or_default().to_string());
        }
        // A failed body read after a successful exchange still errors the
        // test; the response cannot be evaluated without it.
        let body = response
            .text()
            .await
            .map_err(|err| DispatchError::Network(format!("failed to read response body: {err}")))?;

        debug!(url = %request.url, status, body_len = body.len(), "dispatch complete");
        Ok(HttpResponseData { status, headers, body })
    }
}

/// Dispatcher returning one canned response for every request, optionally
/// after a fixed delay. Lets tests and previews exercise the executor and
/// coordinator without a live server.
#[derive(Debug, Clone, Default)]
pub struct StaticDispatcher {
    pub status: u16,
    pub headers: IndexMap<String, String>,
    pub body: String,
    pub delay: Option<Duration>,
}

impl StaticDispatcher {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: IndexMap::new(),
            body: body.into(),
            delay: None,
        }
    }
}

#[async_trait]
impl HttpDispatcher for StaticDispatcher {
    async fn dispatch(&self, _request: &PreparedRequest) -> Result<HttpResponseData, DispatchError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(HttpResponseData {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
        })
    }
}
