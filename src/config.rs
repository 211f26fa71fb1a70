//! TOML configuration parsing and validation.
//!
//! Every section is optional; missing values fall back to the defaults
//! documented on each field. Credentials are not read from this file; see
//! [`crate::env`].
//!
//! ```toml
//! [gateway]
//! provider = "openrouter"
//! timeout_secs = 30
//!
//! [site]
//! url = "https://example.com"
//! name = "Example Store"
//!
//! [index]
//! min_body_length = 50
//! excluded_ids = [42]
//!
//! [retrieval]
//! context_top_k = 3
//!
//! [content]
//! json = "./data/content.json"
//!
//! [content.directory]
//! root = "./docs"
//! include_globs = ["**/*.md"]
//!
//! [server]
//! bind = "127.0.0.1:7341"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub use assistant_gateway_core::IndexSettings;

use crate::provider::{DEFAULT_PROVIDER, PROVIDER_IDS};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub index: IndexSettings,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    /// Preferred provider identifier (`groq`, `runpod`, `openrouter`).
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Per-request network timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

/// Site identity, sent as analytics headers by providers that accept them.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SiteConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_context_top_k")]
    pub context_top_k: usize,
    #[serde(default = "default_context_words")]
    pub context_words: usize,
    /// Result cap for the `search` command and endpoint.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            context_top_k: default_context_top_k(),
            context_words: default_context_words(),
            search_limit: default_search_limit(),
        }
    }
}

fn default_context_top_k() -> usize {
    assistant_gateway_core::rag::DEFAULT_TOP_K
}
fn default_context_words() -> usize {
    assistant_gateway_core::rag::DEFAULT_CONTEXT_WORDS
}
fn default_search_limit() -> usize {
    5
}

/// Where the content snapshot is loaded from. Both sources may be set;
/// JSON items come first.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ContentConfig {
    #[serde(default)]
    pub json: Option<PathBuf>,
    #[serde(default)]
    pub directory: Option<DirectoryContentConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DirectoryContentConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    /// Content type assigned to every scanned file.
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.md".to_string(),
        "**/*.txt".to_string(),
        "**/*.html".to_string(),
    ]
}
fn default_content_type() -> String {
    "page".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

/// Parse a config from TOML text and validate it.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Read, parse, and validate the config file at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

fn validate(config: &Config) -> Result<()> {
    // An unknown preferred provider is not fatal; the gateway falls back
    // to the default when it selects the active provider.
    if !PROVIDER_IDS.contains(&config.gateway.provider.as_str()) {
        tracing::warn!(
            provider = %config.gateway.provider,
            "Unknown provider in config, expected one of: {}",
            PROVIDER_IDS.join(", ")
        );
    }

    if config.gateway.timeout_secs == 0 {
        anyhow::bail!("gateway.timeout_secs must be > 0");
    }

    if config.retrieval.context_top_k < 1 {
        anyhow::bail!("retrieval.context_top_k must be >= 1");
    }
    if config.retrieval.context_words < 1 {
        anyhow::bail!("retrieval.context_words must be >= 1");
    }
    if config.retrieval.search_limit < 1 {
        anyhow::bail!("retrieval.search_limit must be >= 1");
    }

    if let Some(dir) = &config.content.directory {
        if dir.include_globs.is_empty() {
            anyhow::bail!("content.directory.include_globs must not be empty");
        }
    }

    Ok(())
}
