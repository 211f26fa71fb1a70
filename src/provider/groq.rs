//! Groq chat completions (OpenAI-compatible).

use std::sync::Arc;
use std::time::Duration;

use super::http::HttpTransport;
use super::{
    bearer_headers, chat_payload, choice_content, numeric_usage, ChatRequest, ChatResponse,
    ChatResult, Dispatch, Provider, ProviderConfig, ProviderContext,
};

const ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
const KEY_VAR: &str = "GROQ_API_KEY";
const MODEL_VAR: &str = "GROQ_MODEL";
const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

const MODELS: &[&str] = &[
    "llama-3.1-8b-instant",
    "llama-3.1-70b-versatile",
    "llama-3.3-70b-versatile",
    "llama-3.1-405b-reasoning",
    "mixtral-8x7b-32768",
    "gemma-7b-it",
];

pub struct GroqProvider {
    config: ProviderConfig,
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl GroqProvider {
    pub fn new(ctx: &ProviderContext) -> Self {
        Self {
            config: ProviderConfig {
                id: "groq",
                name: "Groq",
                api_key: ctx.env.get(KEY_VAR),
                endpoint: ENDPOINT.to_string(),
                default_model: ctx.env.get_or(MODEL_VAR, DEFAULT_MODEL),
                available_models: MODELS.iter().map(|m| m.to_string()).collect(),
            },
            transport: ctx.transport.clone(),
            timeout: ctx.timeout,
        }
    }

    fn dispatch(&self) -> Dispatch<'_> {
        Dispatch {
            config: &self.config,
            transport: self.transport.as_ref(),
            timeout: self.timeout,
            key_var: KEY_VAR,
            endpoint_var: None,
        }
    }
}

impl Provider for GroqProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn send(&self, request: &ChatRequest) -> ChatResult {
        let dispatch = self.dispatch();
        let api_key = dispatch.preflight(request)?;
        let resolved = request.resolved(&self.config.default_model);

        let body = chat_payload(request, &resolved);
        let reply = dispatch.post(request, bearer_headers(&api_key), body)?;

        Ok(ChatResponse {
            message: choice_content(&reply).unwrap_or_default().to_string(),
            usage: numeric_usage(reply.get("usage")),
            model: reply
                .get("model")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or(resolved.model),
        })
    }
}
