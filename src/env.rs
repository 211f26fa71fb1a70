//! Environment boundary for credentials and model overrides.
//!
//! Providers never call `std::env` directly; they read through an
//! [`EnvSource`] so tests can inject values without touching the process
//! environment. Empty values are treated as unset.

use std::collections::HashMap;

/// Named string settings, typically process environment variables.
pub trait EnvSource: Send + Sync {
    /// Raw lookup. Implementations may return `Some("")`.
    fn lookup(&self, key: &str) -> Option<String>;

    /// Non-empty value of `key`, if any.
    fn get(&self, key: &str) -> Option<String> {
        self.lookup(key).filter(|v| !v.is_empty())
    }

    /// Non-empty value of `key`, or `default`.
    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A fixed set of values. Used in tests and for embedding the gateway
/// in hosts that manage their own secrets.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}
