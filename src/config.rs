//! Configuration management

use std::path::Path;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::oidc::{DefaultProviderSettings, ProviderConfig};
use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// OIDC authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Paths that bypass authentication (prefix match, default: `["/health"]`)
    pub public_paths: Vec<String>,
    /// Upper bound for verifying one token, key fetches included
    pub verification_timeout_secs: u64,
    /// HTTP timeout for discovery and JWKS requests
    pub discovery_timeout_secs: u64,
    /// Clock-skew tolerance for `exp` and `nbf`
    pub leeway_secs: u64,
    /// How long a fetched JWKS stays fresh
    pub jwks_cache_ttl_secs: u64,
    /// Minimum spacing between refetches triggered by an unknown `kid`
    pub jwks_min_refresh_secs: u64,
    /// Provider derived from `OIDC_*` settings
    pub default_provider: DefaultProviderSettings,
    /// Additional explicitly registered providers
    pub providers: Vec<ProviderConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            public_paths: vec!["/health".to_string()],
            verification_timeout_secs: 10,
            discovery_timeout_secs: 10,
            leeway_secs: 60,
            jwks_cache_ttl_secs: 3600,
            jwks_min_refresh_secs: 10,
            default_provider: DefaultProviderSettings::default(),
            providers: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Verification deadline as a [`Duration`].
    #[must_use]
    pub fn verification_timeout(&self) -> Duration {
        Duration::from_secs(self.verification_timeout_secs)
    }

    /// Discovery/JWKS HTTP timeout as a [`Duration`].
    #[must_use]
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    /// Overlay default-provider values taken from the environment.
    ///
    /// Set fields replace file values; `skip_issuer_verify` can only be
    /// switched on.
    pub fn apply_default_provider_overrides(&mut self, overrides: &DefaultProviderSettings) {
        let target = &mut self.default_provider;
        if overrides.issuer.is_some() {
            target.issuer.clone_from(&overrides.issuer);
        }
        if overrides.client_id.is_some() {
            target.client_id.clone_from(&overrides.client_id);
        }
        if overrides.device_client_id.is_some() {
            target.device_client_id.clone_from(&overrides.device_client_id);
        }
        target.skip_issuer_verify |= overrides.skip_issuer_verify;
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        // Load from file if provided
        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // Merge environment variables (ROR_AUTH_ prefix)
        figment = figment.merge(Env::prefixed("ROR_AUTH_").split("__"));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the service unusable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.auth.verification_timeout_secs == 0 {
            return Err(Error::Config(
                "auth.verification_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.auth.discovery_timeout_secs == 0 {
            return Err(Error::Config(
                "auth.discovery_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.auth.public_paths.iter().any(|p| !p.starts_with('/')) {
            return Err(Error::Config(
                "auth.public_paths entries must start with '/'".to_string(),
            ));
        }
        Ok(())
    }
}
