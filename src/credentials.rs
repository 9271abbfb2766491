//! Credential Resolution
//!
//! Providers never hold API keys in their configuration; keys live in the
//! application's secret store and are resolved through this seam at the
//! moment a request is built.

use std::sync::Arc;

/// Source of API keys for provider requests.
pub trait CredentialStore: Send + Sync {
    /// Resolve the API key for a request. `model` lets stores that keep
    /// per-model keys pick the right one; most implementations ignore it.
    ///
    /// Returns `None` when no key is configured.
    fn api_key(&self, model: Option<&str>) -> Option<String>;
}

/// A fixed in-memory credential, mainly for construction from settings
/// already resolved by the caller (and for tests).
pub struct StaticCredentials {
    key: Option<String>,
}

impl StaticCredentials {
    /// A store holding the given key
    pub fn new(key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            key: Some(key.into()),
        })
    }

    /// A store with no key configured
    pub fn none() -> Arc<Self> {
        Arc::new(Self { key: None })
    }
}

impl CredentialStore for StaticCredentials {
    fn api_key(&self, _model: Option<&str>) -> Option<String> {
        self.key.clone()
    }
}
