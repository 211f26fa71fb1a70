//! RunPod serverless `runsync` endpoint.
//!
//! The endpoint URL is derived from `RUNPOD_ENDPOINT_ID`. The chat payload
//! is wrapped in `{"input": ...}` and the worker's reply comes back under
//! `output`, either as OpenAI-style `choices` or as plain `text`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use super::http::HttpTransport;
use super::{
    bearer_headers, chat_payload, choice_content, numeric_usage, ChatRequest, ChatResponse,
    ChatResult, Dispatch, Provider, ProviderConfig, ProviderContext,
};

const KEY_VAR: &str = "RUNPOD_API_KEY";
const ENDPOINT_ID_VAR: &str = "RUNPOD_ENDPOINT_ID";
const MODEL_VAR: &str = "RUNPOD_MODEL";
const DEFAULT_MODEL: &str = "meta-llama/Llama-3.1-8B-Instruct";

const MODELS: &[&str] = &[
    "meta-llama/Llama-3.1-8B-Instruct",
    "meta-llama/Llama-3.1-70B-Instruct",
    "mistralai/Mistral-7B-Instruct-v0.2",
];

pub struct RunPodProvider {
    config: ProviderConfig,
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl RunPodProvider {
    pub fn new(ctx: &ProviderContext) -> Self {
        let endpoint = ctx
            .env
            .get(ENDPOINT_ID_VAR)
            .map(|id| runsync_url(&id))
            .unwrap_or_default();

        Self {
            config: ProviderConfig {
                id: "runpod",
                name: "RunPod",
                api_key: ctx.env.get(KEY_VAR),
                endpoint,
                default_model: ctx.env.get_or(MODEL_VAR, DEFAULT_MODEL),
                available_models: MODELS.iter().map(|m| m.to_string()).collect(),
            },
            transport: ctx.transport.clone(),
            timeout: ctx.timeout,
        }
    }
}

fn runsync_url(endpoint_id: &str) -> String {
    format!("https://api.runpod.io/v2/{}/runsync", endpoint_id)
}

/// `output.choices[0].message.content`, else `output.text`.
fn output_text(output: &Value) -> Option<&str> {
    choice_content(output).or_else(|| output.get("text")?.as_str())
}

impl Provider for RunPodProvider {
    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn send(&self, request: &ChatRequest) -> ChatResult {
        let dispatch = Dispatch {
            config: &self.config,
            transport: self.transport.as_ref(),
            timeout: self.timeout,
            key_var: KEY_VAR,
            endpoint_var: Some(ENDPOINT_ID_VAR),
        };
        let api_key = dispatch.preflight(request)?;
        let resolved = request.resolved(&self.config.default_model);

        let body = json!({ "input": chat_payload(request, &resolved) });
        let reply = dispatch.post(request, bearer_headers(&api_key), body)?;

        let output = reply.get("output").cloned().unwrap_or(Value::Null);
        Ok(ChatResponse {
            message: output_text(&output).unwrap_or_default().to_string(),
            usage: numeric_usage(output.get("usage")),
            model: resolved.model,
        })
    }
}
