//! Issuer URL to provider mapping.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use super::provider::Provider;

/// Registered providers keyed by exact issuer URL.
///
/// Lookups never fall back to a default provider: an unregistered issuer is
/// not found. Providers are published as complete `Arc<Provider>` values, so
/// a reader racing a late registration sees either the old or the new one.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: DashMap<String, Arc<Provider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under `issuer`, replacing any previous entry.
    pub fn add_provider(&self, issuer: impl Into<String>, provider: Arc<Provider>) {
        let issuer = issuer.into();
        if self.providers.insert(issuer.clone(), provider).is_some() {
            info!(issuer = %issuer, "Replaced OIDC provider");
        }
    }

    /// Register `provider` under its own issuer URI.
    pub fn register(&self, provider: Provider) {
        let issuer = provider.issuer().to_string();
        self.add_provider(issuer, Arc::new(provider));
    }

    /// Exact-match lookup.
    #[must_use]
    pub fn get_provider_by_url(&self, issuer: &str) -> Option<Arc<Provider>> {
        self.providers.get(issuer).map(|entry| Arc::clone(entry.value()))
    }

    /// Registered issuer URLs, sorted.
    #[must_use]
    pub fn issuers(&self) -> Vec<String> {
        let mut issuers: Vec<String> = self.providers.iter().map(|e| e.key().clone()).collect();
        issuers.sort();
        issuers
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// True when no provider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
