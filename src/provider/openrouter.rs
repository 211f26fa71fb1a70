//! OpenRouter chat completions.
//!
//! Same request and reply shapes as Groq. Every request also carries
//! `HTTP-Referer` (site URL) and `X-Title` (site name), which OpenRouter
//! uses for attribution.

use std::sync::Arc;
use std::time::Duration;

use super::http::HttpTransport;
use super::{
    bearer_headers, chat_payload, choice_content, numeric_usage, ChatRequest, ChatResponse,
    ChatResult, Dispatch, Provider, ProviderConfig, ProviderContext,
};
use crate::config::SiteConfig;

const ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
const KEY_VAR: &str = "OPENROUTER_API_KEY";
const MODEL_VAR: &str = "OPENROUTER_MODEL";
const DEFAULT_MODEL: &str = "meta-llama/llama-3.1-8b-instruct";

const MODELS: &[&str] = &[
    "meta-llama/llama-3.1-8b-instruct",
    "meta-llama/llama-3.1-70b-instruct",
    "openai/gpt-4",
    "openai/gpt-3.5-turbo",
    "anthropic/claude-3-haiku",
    "anthropic/claude-3-sonnet",
];

pub struct OpenRouterProvider {
    config: ProviderConfig,
    site: SiteConfig,
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl OpenRouterProvider {
    pub fn new(ctx: &ProviderContext) -> Self {
        Self {
            config: ProviderConfig {
                id: "openrouter",
                name: "OpenRouter",
                api_key: ctx.env.get(KEY_VAR),
                endpoint: ENDPOINT.to_string(),
                default_model: ctx.env.get_or(MODEL_VAR, DEFAULT_MODEL),
                available_models: MODELS.iter().map(|m| m.to_string()).collect(),
            },
            site: ctx.site.clone(),
            transport: ctx.transport.clone(),
            timeout: ctx.timeout,
        }
    }
}

impl Provider for OpenRouterProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn send(&self, request: &ChatRequest) -> ChatResult {
        let dispatch = Dispatch {
            config: &self.config,
            transport: self.transport.as_ref(),
            timeout: self.timeout,
            key_var: KEY_VAR,
            endpoint_var: None,
        };
        let api_key = dispatch.preflight(request)?;
        let resolved = request.resolved(&self.config.default_model);

        let mut headers = bearer_headers(&api_key);
        headers.push(("HTTP-Referer".to_string(), self.site.url.clone()));
        headers.push(("X-Title".to_string(), self.site.name.clone()));

        let reply = dispatch.post(request, headers, chat_payload(request, &resolved))?;

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::provider::http::MockTransport;
    use crate::provider::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_attribution_headers() {
        let transport = Arc::new(MockTransport::ok_json(&json!({
            "choices": [{"message": {"content": "ok"}}]
        })));
        let ctx = ProviderContext::new(
            Arc::new(MapEnv::new().with(KEY_VAR, "sk-or")),
            transport.clone(),
        )
        .with_site(SiteConfig {
            url: "https://shop.example".to_string(),
            name: "Example Shop".to_string(),
        });
        let provider = OpenRouterProvider::new(&ctx);

        let resp = provider.send(&ChatRequest::new("Hi")).unwrap();
        assert_eq!(resp.message, "ok");
        assert_eq!(resp.model, DEFAULT_MODEL);

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.header("HTTP-Referer"), Some("https://shop.example"));
        assert_eq!(sent.header("X-Title"), Some("Example Shop"));
        assert_eq!(sent.header("Authorization"), Some("Bearer sk-or"));
    }

    #[test]
    fn test_api_error_without_message_uses_generic_text() {
        let transport = Arc::new(MockTransport::respond(503, "upstream unavailable"));
        let ctx = ProviderContext::new(Arc::new(MapEnv::new().with(KEY_VAR, "k")), transport);
        let err = OpenRouterProvider::new(&ctx)
            .send(&ChatRequest::new("Hi"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ApiError);
        assert_eq!(err.http_status(), Some(503));
        assert_eq!(err.to_string(), "OpenRouter API error");
    }
}
