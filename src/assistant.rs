//! Host-facing orchestrator.
//!
//! [`Assistant`] ties the content snapshot, the retrieval pipeline and the
//! provider gateway together. The CLI and the HTTP server both call into
//! it; neither touches providers or the indexer directly.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, info};

use assistant_gateway_core::{
    ContentIndexer, ContentSearcher, ContentSource, IndexSettings, IndexStats, RetrievalEngine,
    SearchResult,
};

use crate::config::{Config, RetrievalConfig};
use crate::content::load_content_source;
use crate::env::EnvSource;
use crate::gateway::ProviderGateway;
use crate::provider::http::HttpTransport;
use crate::provider::{
    ChatRequest, ChatResponse, ChatResult, Provider, ProviderContext, ProviderError, ProviderInfo,
};

/// Per-call options for [`Assistant::send_message`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SendOptions {
    /// Explicit provider identifier. Unlike the configured preference,
    /// an explicit choice never falls back.
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Prepend retrieved site content to the message.
    pub use_context: bool,
    /// Upper bound on the provider call, in seconds.
    pub deadline_secs: Option<u64>,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            temperature: None,
            max_tokens: None,
            use_context: true,
            deadline_secs: None,
        }
    }
}

pub struct Assistant {
    gateway: ProviderGateway,
    source: Box<dyn ContentSource>,
    index: IndexSettings,
    retrieval: RetrievalConfig,
}

impl Assistant {
    pub fn new(
        gateway: ProviderGateway,
        source: Box<dyn ContentSource>,
        index: IndexSettings,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            gateway,
            source,
            index,
            retrieval,
        }
    }

    /// Load the content snapshot and wire the gateway from `config`.
    pub fn from_config(
        config: &Config,
        env: Arc<dyn EnvSource>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let source = load_content_source(&config.content)?;
        let ctx = ProviderContext::new(env, transport)
            .with_site(config.site.clone())
            .with_timeout(Duration::from_secs(config.gateway.timeout_secs));
        let gateway = ProviderGateway::new(ctx, config.gateway.provider.clone());

        Ok(Self::new(
            gateway,
            Box::new(source),
            config.index.clone(),
            config.retrieval.clone(),
        ))
    }

    pub fn gateway(&self) -> &ProviderGateway {
        &self.gateway
    }

    fn indexer(&self) -> ContentIndexer<'_> {
        ContentIndexer::new(self.source.as_ref(), &self.index)
    }

    fn engine(&self) -> RetrievalEngine<'_> {
        RetrievalEngine::new(ContentSearcher::new(self.indexer()))
            .with_top_k(self.retrieval.context_top_k)
            .with_context_words(self.retrieval.context_words)
    }

    // ============ Retrieval ============

    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        ContentSearcher::new(self.indexer()).search(query, limit)
    }

    /// Search with the configured result cap.
    pub fn search_default(&self, query: &str) -> Vec<SearchResult> {
        self.search(query, self.retrieval.search_limit)
    }

    pub fn get_context(&self, query: &str) -> String {
        self.engine().build_context(query)
    }

    pub fn augment_message(&self, message: &str) -> String {
        self.engine().augment(message)
    }

    pub fn index_stats(&self) -> IndexStats {
        self.indexer().stats()
    }

    // ============ Providers ============

    pub fn list_providers(&self) -> Vec<ProviderInfo> {
        self.gateway.list_all().iter().map(|p| p.info()).collect()
    }

    pub fn list_configured_providers(&self) -> Vec<ProviderInfo> {
        self.gateway
            .list_configured()
            .iter()
            .map(|p| p.info())
            .collect()
    }

    pub fn active_provider(&self) -> Arc<dyn Provider> {
        self.gateway.active_provider()
    }

    /// The adapter [`send_message`](Self::send_message) would use.
    pub fn resolve_provider(&self, options: &SendOptions) -> Result<Arc<dyn Provider>, ProviderError> {
        match options.provider.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => match self.gateway.get(id) {
                Some(provider) if provider.is_configured() => Ok(provider),
                _ => Err(ProviderError::ProviderNotConfigured(id.to_string())),
            },
            None => Ok(self.gateway.active_provider()),
        }
    }

    /// Send `message` to a provider, augmented with site content unless
    /// `options.use_context` is off.
    pub fn send_message(&self, message: &str, options: &SendOptions) -> ChatResult {
        self.dispatch(message, options).map(|(_, response)| response)
    }

    /// Like [`send_message`](Self::send_message), also returning the
    /// adapter that handled the request.
    pub fn dispatch(
        &self,
        message: &str,
        options: &SendOptions,
    ) -> Result<(Arc<dyn Provider>, ChatResponse), ProviderError> {
        if message.trim().is_empty() {
            return Err(ProviderError::EmptyMessage);
        }

        let provider = self.resolve_provider(options)?;

        let prompt = if options.use_context {
            self.augment_message(message)
        } else {
            message.to_string()
        };
        debug!(
            augmented = prompt.len() != message.len(),
            prompt_chars = prompt.chars().count(),
            "prompt prepared"
        );

        let request = ChatRequest {
            message: prompt,
            model: options.model.clone(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            deadline: options.deadline_secs.map(Duration::from_secs),
        };

        info!(provider = provider.id(), "dispatching chat request");
        let response = provider.send(&request)?;
        Ok((provider, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::provider::http::MockTransport;
    use crate::provider::ErrorKind;
    use assistant_gateway_core::{ContentItem, InMemorySource};
    use serde_json::json;

    fn item(id: u64, title: &str, body: &str) -> ContentItem {
        ContentItem {
            id,
            content_type: "page".to_string(),
            status: "publish".to_string(),
            title: title.to_string(),
            body: body.to_string(),
            excerpt: String::new(),
            permalink: format!("https://example.com/{}", id),
        }
    }

    fn assistant(env: MapEnv, transport: Arc<MockTransport>) -> Assistant {
        let source = InMemorySource::new(vec![
            item(
                1,
                "Refund Policy",
                "Customers may request a refund within 30 days of purchase.",
            ),
            item(
                2,
                "Shipping",
                "Orders ship within two business days to every region we serve.",
            ),
        ]);
        let ctx = ProviderContext::new(Arc::new(env), transport);
        Assistant::new(
            ProviderGateway::new(ctx, "groq"),
            Box::new(source),
            IndexSettings::default(),
            RetrievalConfig::default(),
        )
    }

    fn groq_reply() -> Arc<MockTransport> {
        Arc::new(MockTransport::ok_json(&json!({
            "choices": [{"message": {"content": "Within 30 days."}}],
            "model": "llama-3.1-8b-instant"
        })))
    }

    #[test]
    fn test_empty_message_rejected() {
        let transport = groq_reply();
        let a = assistant(MapEnv::new().with("GROQ_API_KEY", "k"), transport.clone());
        let err = a.send_message("   ", &SendOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyMessage);
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_send_augments_by_default() {
        let transport = groq_reply();
        let a = assistant(MapEnv::new().with("GROQ_API_KEY", "k"), transport.clone());
        let resp = a
            .send_message("What is the refund policy?", &SendOptions::default())
            .unwrap();
        assert_eq!(resp.message, "Within 30 days.");

        let sent = transport.last_request().unwrap();
        let content = sent.body["messages"][0]["content"].as_str().unwrap();
        assert!(content.starts_with("Relevant information from website:"));
        assert!(content.ends_with("What is the refund policy?"));
    }

    #[test]
    fn test_send_without_context() {
        let transport = groq_reply();
        let a = assistant(MapEnv::new().with("GROQ_API_KEY", "k"), transport.clone());
        let options = SendOptions {
            use_context: false,
            ..SendOptions::default()
        };
        a.send_message("What is the refund policy?", &options).unwrap();
        let sent = transport.last_request().unwrap();
        assert_eq!(sent.body["messages"][0]["content"], "What is the refund policy?");
    }

    #[test]
    fn test_explicit_unconfigured_provider() {
        let transport = groq_reply();
        let a = assistant(MapEnv::new().with("GROQ_API_KEY", "k"), transport.clone());
        for id in ["openrouter", "mystery"] {
            let options = SendOptions {
                provider: Some(id.to_string()),
                ..SendOptions::default()
            };
            let err = a.send_message("hello there", &options).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ProviderNotConfigured);
        }
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_dispatch_reports_the_handling_provider() {
        let transport = groq_reply();
        let env = MapEnv::new()
            .with("GROQ_API_KEY", "k")
            .with("OPENROUTER_API_KEY", "k");
        let a = assistant(env, transport.clone());

        let (provider, _) = a.dispatch("hello there", &SendOptions::default()).unwrap();
        assert_eq!(provider.id(), "groq");

        let options = SendOptions {
            provider: Some("openrouter".to_string()),
            ..SendOptions::default()
        };
        let (provider, resp) = a.dispatch("hello there", &options).unwrap();
        assert_eq!(provider.id(), "openrouter");
        assert_eq!(resp.message, "Within 30 days.");
        assert_eq!(
            transport.last_request().unwrap().url,
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(transport.calls(), 2);
    }

    #[test]
    fn test_retrieval_passthrough() {
        let a = assistant(MapEnv::new(), groq_reply());
        assert_eq!(a.index_stats().items, 2);
        assert_eq!(a.search("refund", 5)[0].item.id, 1);
        assert!(a.get_context("zzz").is_empty());
        assert_eq!(a.augment_message("zzz"), "zzz");
        assert_eq!(a.list_providers().len(), 3);
        assert!(a.list_configured_providers().is_empty());
    }

    #[test]
    fn test_send_options_deserialize_defaults() {
        let options: SendOptions = serde_json::from_str(r#"{"model": "gemma-7b-it"}"#).unwrap();
        assert!(options.use_context);
        assert_eq!(options.model.as_deref(), Some("gemma-7b-it"));
        assert!(options.provider.is_none());
    }
}
