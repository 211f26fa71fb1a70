//! Chat provider abstraction and backend adapters.
//!
//! Defines the [`Provider`] trait and three adapters:
//! - **[`GroqProvider`]**: OpenAI-compatible chat completions at a fixed URL.
//! - **[`OpenRouterProvider`]**: same dialect plus `HTTP-Referer` / `X-Title`
//!   analytics headers.
//! - **[`RunPodProvider`]**: serverless `runsync` endpoint derived from
//!   `RUNPOD_ENDPOINT_ID`; payload nested under `input`, reply nested under
//!   `output`.
//!
//! # Send Contract
//!
//! Every adapter's [`send`](Provider::send) follows the same steps:
//!
//! 1. No API key → [`ProviderError::NoApiKey`], no network call.
//! 2. No endpoint → [`ProviderError::NoEndpoint`], no network call.
//! 3. Invalid temperature / max tokens → [`ProviderError::InvalidRequest`].
//! 4. One POST with `Authorization: Bearer <key>` and a JSON body, bounded
//!    by the configured timeout (or the request deadline, if shorter).
//! 5. Connection failure → [`ProviderError::Transport`].
//! 6. Status other than 200 → [`ProviderError::Api`], carrying
//!    `error.message` from the body when present.
//! 7. 200 → parsed [`ChatResponse`]. Missing fields degrade to an empty
//!    message; a body that is not a JSON object is
//!    [`ProviderError::MalformedResponse`].
//!
//! There are no retries at any layer.

mod groq;
pub mod http;
mod openrouter;
mod runpod;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub use groq::GroqProvider;
pub use openrouter::OpenRouterProvider;
pub use runpod::RunPodProvider;

use crate::config::SiteConfig;
use crate::env::EnvSource;
use http::{HttpRequest, HttpTransport};

/// Provider used when the preferred one is unknown or unconfigured.
pub const DEFAULT_PROVIDER: &str = "groq";
/// Every registered provider identifier, in registration order.
pub const PROVIDER_IDS: [&str; 3] = ["groq", "runpod", "openrouter"];

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ============ Request / Response ============

/// A single-turn chat request. Unset fields take the adapter defaults:
/// temperature 0.7, 1024 max tokens, the provider's default model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub model: Option<String>,
    /// Sampling temperature in `[0, 2]`.
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Upper bound on the network call; the shorter of this and the
    /// provider timeout applies.
    pub deadline: Option<Duration>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ProviderError::InvalidRequest(format!(
                    "temperature must be in [0, 2], got {}",
                    t
                )));
            }
        }
        if self.max_tokens == Some(0) {
            return Err(ProviderError::InvalidRequest(
                "max_tokens must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    fn resolved(&self, default_model: &str) -> ResolvedRequest {
        ResolvedRequest {
            model: self
                .model
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| default_model.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        }
    }

    fn effective_timeout(&self, timeout: Duration) -> Duration {
        match self.deadline {
            Some(deadline) => deadline.min(timeout),
            None => timeout,
        }
    }
}

/// Request fields after defaults are applied.
#[derive(Debug, Clone, PartialEq)]
struct ResolvedRequest {
    model: String,
    temperature: f32,
    max_tokens: u32,
}

/// A successful completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    /// Numeric usage counters reported by the backend; may be empty.
    #[serde(default)]
    pub usage: BTreeMap<String, Number>,
    pub model: String,
}

/// The Success | Failure outcome of a chat call.
pub type ChatResult = Result<ChatResponse, ProviderError>;

// ============ Errors ============

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NoApiKey,
    NoEndpoint,
    TransportError,
    ApiError,
    MalformedResponse,
    EmptyMessage,
    ProviderNotConfigured,
    InvalidRequest,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::NoApiKey => "no_api_key",
            ErrorKind::NoEndpoint => "no_endpoint",
            ErrorKind::TransportError => "transport_error",
            ErrorKind::ApiError => "api_error",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::EmptyMessage => "empty_message",
            ErrorKind::ProviderNotConfigured => "provider_not_configured",
            ErrorKind::InvalidRequest => "invalid_request",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("{provider} API key is not configured. Set {env_var} in the environment.")]
    NoApiKey {
        provider: String,
        env_var: &'static str,
    },

    #[error("{provider} endpoint is not configured. Set {env_var} in the environment.")]
    NoEndpoint {
        provider: String,
        env_var: &'static str,
    },

    #[error("{provider} request failed: {detail}")]
    Transport { provider: String, detail: String },

    #[error("{message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} returned an unreadable response: {detail}")]
    MalformedResponse { provider: String, detail: String },

    #[error("Message cannot be empty.")]
    EmptyMessage,

    #[error("Selected provider is not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::NoApiKey { .. } => ErrorKind::NoApiKey,
            ProviderError::NoEndpoint { .. } => ErrorKind::NoEndpoint,
            ProviderError::Transport { .. } => ErrorKind::TransportError,
            ProviderError::Api { .. } => ErrorKind::ApiError,
            ProviderError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            ProviderError::EmptyMessage => ErrorKind::EmptyMessage,
            ProviderError::ProviderNotConfigured(_) => ErrorKind::ProviderNotConfigured,
            ProviderError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }

    /// Upstream HTTP status, for [`ProviderError::Api`] only.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ProviderError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ============ Provider trait ============

/// Resolved, immutable settings of one backend.
///
/// Built once from the environment when the provider is constructed.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub id: &'static str,
    pub name: &'static str,
    pub api_key: Option<String>,
    /// Empty when it cannot be resolved.
    pub endpoint: String,
    pub default_model: String,
    pub available_models: Vec<String>,
}

impl ProviderConfig {
    /// Both a credential and an endpoint are available.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty()) && !self.endpoint.is_empty()
    }
}

/// Public, credential-free description of a provider.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub configured: bool,
    pub default_model: String,
    pub available_models: Vec<String>,
}

/// A chat-completion backend.
///
/// Implementations never panic on expected failures; they return a
/// [`ProviderError`] through [`ChatResult`].
pub trait Provider: Send + Sync {
    /// Resolved configuration of this backend.
    fn config(&self) -> &ProviderConfig;

    /// Perform one chat completion.
    fn send(&self, request: &ChatRequest) -> ChatResult;

    /// Registry identifier (e.g. `"groq"`).
    fn id(&self) -> &str {
        self.config().id
    }

    /// Human-readable name (e.g. `"Groq"`).
    fn name(&self) -> &str {
        self.config().name
    }

    fn is_configured(&self) -> bool {
        self.config().is_configured()
    }

    fn available_models(&self) -> &[String] {
        &self.config().available_models
    }

    fn info(&self) -> ProviderInfo {
        let config = self.config();
        ProviderInfo {
            id: config.id.to_string(),
            name: config.name.to_string(),
            configured: self.is_configured(),
            default_model: config.default_model.clone(),
            available_models: config.available_models.clone(),
        }
    }
}

/// Shared construction inputs for every adapter.
#[derive(Clone)]
pub struct ProviderContext {
    pub env: Arc<dyn EnvSource>,
    pub transport: Arc<dyn HttpTransport>,
    pub site: SiteConfig,
    pub timeout: Duration,
}

impl ProviderContext {
    pub fn new(env: Arc<dyn EnvSource>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            env,
            transport,
            site: SiteConfig::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_site(mut self, site: SiteConfig) -> Self {
        self.site = site;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Build the adapter registered under `id`.
pub fn build_provider(id: &str, ctx: &ProviderContext) -> Option<Arc<dyn Provider>> {
    let provider: Arc<dyn Provider> = match id {
        "groq" => Arc::new(GroqProvider::new(ctx)),
        "runpod" => Arc::new(RunPodProvider::new(ctx)),
        "openrouter" => Arc::new(OpenRouterProvider::new(ctx)),
        _ => return None,
    };
    Some(provider)
}

// ============ Shared plumbing ============

/// Everything an adapter needs besides its own settings.
pub(crate) struct Dispatch<'a> {
    pub config: &'a ProviderConfig,
    pub transport: &'a dyn HttpTransport,
    pub timeout: Duration,
    /// Name of the variable that supplies the API key.
    pub key_var: &'static str,
    /// Name of the variable that supplies the endpoint, if it is configurable.
    pub endpoint_var: Option<&'static str>,
}

impl Dispatch<'_> {
    /// Steps 1–3 of the send contract: returns the API key to use.
    pub fn preflight(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => {
                return Err(ProviderError::NoApiKey {
                    provider: self.config.name.to_string(),
                    env_var: self.key_var,
                })
            }
        };

        if self.config.endpoint.is_empty() {
            return Err(ProviderError::NoEndpoint {
                provider: self.config.name.to_string(),
                env_var: self.endpoint_var.unwrap_or(self.key_var),
            });
        }

        request.validate()?;
        Ok(api_key)
    }

    /// Steps 4–6: POST `body` and return the decoded 200 payload.
    pub fn post(
        &self,
        request: &ChatRequest,
        headers: Vec<(String, String)>,
        body: Value,
    ) -> Result<Value, ProviderError> {
        let http_request = HttpRequest {
            url: self.config.endpoint.clone(),
            headers,
            body,
            timeout: request.effective_timeout(self.timeout),
        };

        debug!(
            provider = self.config.id,
            url = %http_request.url,
            timeout_ms = http_request.timeout.as_millis() as u64,
            "sending chat request"
        );

        let response = self
            .transport
            .post_json(&http_request)
            .map_err(|e| {
                warn!(provider = self.config.id, error = %e, "transport failure");
                ProviderError::Transport {
                    provider: self.config.name.to_string(),
                    detail: e.to_string(),
                }
            })?;

        if response.status != 200 {
            let message = extract_error_message(&response.body)
                .unwrap_or_else(|| format!("{} API error", self.config.name));
            warn!(
                provider = self.config.id,
                status = response.status,
                "provider returned an error status"
            );
            return Err(ProviderError::Api {
                provider: self.config.name.to_string(),
                status: response.status,
                message,
            });
        }

        match serde_json::from_str::<Value>(&response.body) {
            Ok(value) if value.is_object() => Ok(value),
            Ok(_) => Err(ProviderError::MalformedResponse {
                provider: self.config.name.to_string(),
                detail: "expected a JSON object".to_string(),
            }),
            Err(e) => Err(ProviderError::MalformedResponse {
                provider: self.config.name.to_string(),
                detail: e.to_string(),
            }),
        }
    }
}

/// `Authorization` and `Content-Type` headers shared by every backend.
pub(crate) fn bearer_headers(api_key: &str) -> Vec<(String, String)> {
    vec![
        ("Authorization".to_string(), format!("Bearer {}", api_key)),
        ("Content-Type".to_string(), "application/json".to_string()),
    ]
}

/// OpenAI-style chat payload with the message as a single user turn.
fn chat_payload(request: &ChatRequest, resolved: &ResolvedRequest) -> Value {
    json!({
        "model": resolved.model,
        "messages": [
            { "role": "user", "content": request.message }
        ],
        "temperature": resolved.temperature,
        "max_tokens": resolved.max_tokens,
    })
}

/// `choices[0].message.content` of an OpenAI-style reply.
fn choice_content(value: &Value) -> Option<&str> {
    value
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

/// Numeric members of a `usage` object; anything else is ignored.
fn numeric_usage(usage: Option<&Value>) -> BTreeMap<String, Number> {
    usage
        .and_then(Value::as_object)
        .map(|obj: &Map<String, Value>| {
            obj.iter()
                .filter_map(|(k, v)| match v {
                    Value::Number(n) => Some((k.clone(), n.clone())),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Provider-supplied `error.message` of a failure body, if any.
fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let resolved = ChatRequest::new("hi").resolved("base-model");
        assert_eq!(resolved.model, "base-model");
        assert!((resolved.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(resolved.max_tokens, 1024);

        let resolved = ChatRequest::new("hi")
            .with_model("other")
            .with_temperature(0.0)
            .with_max_tokens(5)
            .resolved("base-model");
        assert_eq!(resolved.model, "other");
        assert_eq!(resolved.temperature, 0.0);
        assert_eq!(resolved.max_tokens, 5);
    }

    #[test]
    fn test_empty_model_falls_back_to_default() {
        let resolved = ChatRequest::new("hi").with_model("").resolved("base-model");
        assert_eq!(resolved.model, "base-model");
    }

    #[test]
    fn test_validate() {
        assert!(ChatRequest::new("x").validate().is_ok());
        assert!(ChatRequest::new("x").with_temperature(2.0).validate().is_ok());
        let err = ChatRequest::new("x")
            .with_temperature(2.5)
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(ChatRequest::new("x").with_temperature(-0.1).validate().is_err());
        assert!(ChatRequest::new("x").with_max_tokens(0).validate().is_err());
    }

    #[test]
    fn test_effective_timeout() {
        let req = ChatRequest::new("x");
        assert_eq!(req.effective_timeout(DEFAULT_TIMEOUT), DEFAULT_TIMEOUT);
        let req = req.with_deadline(Duration::from_secs(5));
        assert_eq!(
            req.effective_timeout(DEFAULT_TIMEOUT),
            Duration::from_secs(5)
        );
        let req = ChatRequest::new("x").with_deadline(Duration::from_secs(90));
        assert_eq!(req.effective_timeout(DEFAULT_TIMEOUT), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_chat_payload_shape() {
        let req = ChatRequest::new("Hello");
        let body = chat_payload(&req, &req.resolved("m"));
        assert_eq!(body["model"], "m");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hello");
        assert_eq!(body["max_tokens"], 1024);
        assert!(body["temperature"].is_number());
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"Invalid API Key"}}"#).as_deref(),
            Some("Invalid API Key")
        );
        assert_eq!(extract_error_message(r#"{"error":"flat"}"#), None);
        assert_eq!(extract_error_message("<html>502</html>"), None);
    }

    #[test]
    fn test_numeric_usage_filters_non_numbers() {
        let usage = json!({"prompt_tokens": 3, "total_time": 0.25, "note": "x", "nested": {}});
        let map = numeric_usage(Some(&usage));
        assert_eq!(map.len(), 2);
        assert_eq!(map["prompt_tokens"].as_u64(), Some(3));
        assert!(numeric_usage(None).is_empty());
    }

    #[test]
    fn test_configured_requires_key_and_endpoint() {
        let mut config = ProviderConfig {
            id: "groq",
            name: "Groq",
            api_key: Some("k".to_string()),
            endpoint: "https://x".to_string(),
            default_model: "m".to_string(),
            available_models: vec![],
        };
        assert!(config.is_configured());
        config.endpoint.clear();
        assert!(!config.is_configured());
        config.endpoint = "https://x".to_string();
        config.api_key = Some(String::new());
        assert!(!config.is_configured());
        config.api_key = None;
        assert!(!config.is_configured());
    }

    #[test]
    fn test_error_kinds_and_status() {
        let err = ProviderError::Api {
            provider: "Groq".into(),
            status: 429,
            message: "Rate limit".into(),
        };
        assert_eq!(err.kind(), ErrorKind::ApiError);
        assert_eq!(err.http_status(), Some(429));
        assert_eq!(err.to_string(), "Rate limit");
        assert_eq!(ProviderError::EmptyMessage.http_status(), None);
        assert_eq!(ErrorKind::NoApiKey.code(), "no_api_key");
    }
}
