//! Provider registry and active-provider selection.
//!
//! The registry is built once, on first use, from a [`ProviderContext`]
//! and then shared read-only. Selection reads the preferred identifier
//! from configuration and falls back to [`DEFAULT_PROVIDER`] when the
//! preferred backend is missing or unconfigured. The fallback does not
//! search for another configured backend. Listings keep registration
//! order.

use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::provider::{
    build_provider, GroqProvider, Provider, ProviderContext, DEFAULT_PROVIDER, PROVIDER_IDS,
};

pub struct ProviderGateway {
    ctx: ProviderContext,
    preferred: String,
    registry: OnceLock<Registry>,
}

struct Registry {
    providers: Vec<Arc<dyn Provider>>,
    default: Arc<dyn Provider>,
}

impl Registry {
    fn build(ctx: &ProviderContext) -> Self {
        let providers: Vec<Arc<dyn Provider>> = PROVIDER_IDS
            .iter()
            .filter_map(|id| build_provider(id, ctx))
            .collect();

        let default: Arc<dyn Provider> =
            match providers.iter().find(|p| p.id() == DEFAULT_PROVIDER) {
                Some(p) => p.clone(),
                None => Arc::new(GroqProvider::new(ctx)),
            };

        debug!(
            providers = providers.len(),
            configured = providers.iter().filter(|p| p.is_configured()).count(),
            "provider registry built"
        );

        Self { providers, default }
    }
}

impl ProviderGateway {
    /// `preferred` is the configured provider identifier; an empty string
    /// selects [`DEFAULT_PROVIDER`].
    pub fn new(ctx: ProviderContext, preferred: impl Into<String>) -> Self {
        let preferred = preferred.into();
        Self {
            ctx,
            preferred: if preferred.is_empty() {
                DEFAULT_PROVIDER.to_string()
            } else {
                preferred
            },
            registry: OnceLock::new(),
        }
    }

    fn registry(&self) -> &Registry {
        self.registry.get_or_init(|| Registry::build(&self.ctx))
    }

    pub fn preferred(&self) -> &str {
        &self.preferred
    }

    /// Every registered adapter, in registration order.
    pub fn list_all(&self) -> &[Arc<dyn Provider>] {
        &self.registry().providers
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Provider>> {
        self.list_all().iter().find(|p| p.id() == id).cloned()
    }

    /// Only the adapters whose credential and endpoint are both present.
    pub fn list_configured(&self) -> Vec<Arc<dyn Provider>> {
        self.list_all()
            .iter()
            .filter(|p| p.is_configured())
            .cloned()
            .collect()
    }

    /// The preferred adapter if it exists and is configured, else the
    /// default adapter, configured or not.
    pub fn active_provider(&self) -> Arc<dyn Provider> {
        match self.get(&self.preferred) {
            Some(provider) if provider.is_configured() => provider,
            Some(_) => {
                warn!(
                    preferred = %self.preferred,
                    fallback = DEFAULT_PROVIDER,
                    "preferred provider is not configured, using default"
                );
                self.registry().default.clone()
            }
            None => {
                info!(
                    preferred = %self.preferred,
                    fallback = DEFAULT_PROVIDER,
                    "unknown provider, using default"
                );
                self.registry().default.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::provider::http::MockTransport;

    fn ids(providers: &[Arc<dyn Provider>]) -> Vec<&str> {
        providers.iter().map(|p| p.id()).collect()
    }

    fn gateway(env: MapEnv, preferred: &str) -> ProviderGateway {
        let ctx = ProviderContext::new(
            Arc::new(env),
            Arc::new(MockTransport::respond(200, "{}")),
        );
        ProviderGateway::new(ctx, preferred)
    }

    #[test]
    fn test_registry_is_built_once() {
        let gw = gateway(MapEnv::new(), "groq");
        let first = gw.get("groq").unwrap();
        let second = gw.get("groq").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(ids(gw.list_all()), vec!["groq", "runpod", "openrouter"]);
        assert!(gw.get("mystery").is_none());
    }

    #[test]
    fn test_list_configured() {
        let env = MapEnv::new()
            .with("OPENROUTER_API_KEY", "k")
            .with("RUNPOD_API_KEY", "k");
        let gw = gateway(env, "groq");
        let configured = gw.list_configured();
        // RunPod has a key but no endpoint id.
        assert_eq!(ids(&configured), vec!["openrouter"]);
    }

    #[test]
    fn test_preferred_configured_is_selected() {
        let gw = gateway(MapEnv::new().with("OPENROUTER_API_KEY", "k"), "openrouter");
        assert_eq!(gw.active_provider().id(), "openrouter");
    }

    #[test]
    fn test_fallback_is_always_the_default() {
        // OpenRouter is configured, RunPod is preferred but unconfigured:
        // selection lands on Groq, not on the configured OpenRouter.
        let gw = gateway(MapEnv::new().with("OPENROUTER_API_KEY", "k"), "runpod");
        let active = gw.active_provider();
        assert_eq!(active.id(), "groq");
        assert!(!active.is_configured());
    }

    #[test]
    fn test_unknown_or_empty_preference() {
        assert_eq!(gateway(MapEnv::new(), "mystery").active_provider().id(), "groq");
        let gw = gateway(MapEnv::new(), "");
        assert_eq!(gw.preferred(), "groq");
        assert_eq!(gw.active_provider().id(), "groq");
    }
}
