//! Startup registration of configured providers.

use std::time::Duration;

use reqwest::Client;
use tracing::{error, info};

use super::provider::{Provider, ProviderConfig, VerifierOptions};
use super::registry::ProviderRegistry;
use crate::config::AuthConfig;
use crate::{Error, Result};

/// HTTP client used for discovery and JWKS fetches.
///
/// # Errors
///
/// Returns [`Error::Http`] if the TLS backend cannot be initialised.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(concat!("ror-auth/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Build the registry from the default provider and the explicit list.
///
/// A provider that fails construction is logged and skipped; its tokens
/// will be rejected as coming from an unknown issuer.
///
/// # Errors
///
/// Returns [`Error::NoProviders`] if no provider ends up registered.
pub async fn load_providers(http: &Client, auth: &AuthConfig) -> Result<ProviderRegistry> {
    let options = VerifierOptions {
        leeway_secs: auth.leeway_secs,
        jwks_cache_ttl: Duration::from_secs(auth.jwks_cache_ttl_secs),
        jwks_min_refresh_interval: Duration::from_secs(auth.jwks_min_refresh_secs),
    };

    let registry = ProviderRegistry::new();
    let mut configured = 0usize;
    let mut failed = 0usize;

    let mut configs: Vec<ProviderConfig> = Vec::with_capacity(auth.providers.len() + 1);
    match auth.default_provider.to_provider_config() {
        Ok(Some(config)) => configs.push(config),
        Ok(None) => {}
        Err(e) => {
            configured += 1;
            failed += 1;
            error!(error = %e, "Default OIDC provider discarded");
        }
    }
    configs.extend(auth.providers.iter().cloned());

    for config in &configs {
        configured += 1;
        match Provider::discover(http, config, options).await {
            Ok(provider) => registry.register(provider),
            Err(e) => {
                failed += 1;
                error!(issuer = %config.issuer, error = %e, "OIDC provider discarded");
            }
        }
    }

    if registry.is_empty() {
        return Err(Error::NoProviders { configured, failed });
    }

    info!(
        providers = registry.len(),
        failed,
        "OIDC provider registry ready"
    );
    Ok(registry)
}
