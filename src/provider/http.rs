//! Outbound HTTP seam for provider adapters.
//!
//! Adapters build an [`HttpRequest`] and hand it to an [`HttpTransport`].
//! Production uses [`ReqwestTransport`] (blocking reqwest client, one POST
//! per call, no retries). Tests use `MockTransport`, which records every
//! request and replays a canned response, so "no network call was made"
//! is observable as `calls() == 0`. It is compiled only for this crate's
//! tests or with the `test-support` feature.

use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use thiserror::Error;

/// A JSON POST about to be sent.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Connection-level failure: DNS, connect, TLS, timeout, or body read.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

pub trait HttpTransport: Send + Sync {
    fn post_json(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

// ============ reqwest ============

/// [`HttpTransport`] over `reqwest::blocking`.
///
/// Must be created and dropped outside an async runtime context; the
/// server calls it from a blocking thread.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("assistant-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn post_json(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.post(&request.url).timeout(request.timeout);
        // Headers go first so `json` does not add a second Content-Type.
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = builder.json(&request.body);

        let response = builder
            .send()
            .map_err(|e| TransportError(describe_reqwest_error(&e)))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| TransportError(describe_reqwest_error(&e)))?;

        Ok(HttpResponse { status, body })
    }
}

fn describe_reqwest_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

// ============ mock ============

#[cfg(any(test, feature = "test-support"))]
pub use mock::MockTransport;

#[cfg(any(test, feature = "test-support"))]
mod mock {
    use std::sync::Mutex;

    use serde_json::Value;

    use super::{HttpRequest, HttpResponse, HttpTransport, TransportError};

    /// Records requests and replays one canned outcome.
    pub struct MockTransport {
        outcome: Result<HttpResponse, TransportError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockTransport {
        /// Respond to every call with `status` and `body`.
        pub fn respond(status: u16, body: impl Into<String>) -> Self {
            Self {
                outcome: Ok(HttpResponse {
                    status,
                    body: body.into(),
                }),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Respond with `200` and `body` serialized as JSON.
        pub fn ok_json(body: &Value) -> Self {
            Self::respond(200, body.to_string())
        }

        /// Fail every call at the connection level.
        pub fn fail(message: impl Into<String>) -> Self {
            Self {
                outcome: Err(TransportError(message.into())),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().map(|r| r.len()).unwrap_or(0)
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }

        pub fn last_request(&self) -> Option<HttpRequest> {
            self.requests.lock().ok().and_then(|r| r.last().cloned())
        }
    }

    impl HttpTransport for MockTransport {
        fn post_json(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            self.outcome.clone()
        }
    }
}
