//! OIDC providers: configuration, trust mode, and the immutable [`Provider`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use super::discovery::ProviderMetadata;
use super::jwks::{DEFAULT_JWKS_TTL, JwksCache, MIN_REFRESH_INTERVAL};
use super::verifier::{DEFAULT_LEEWAY_SECS, JwksVerifier, TokenVerifier};
use super::{ProviderError, VerifyError};

/// How much of the verification chain a provider enforces.
///
/// Every mode checks `iss` against the provider URI, `aud`, `exp` and `nbf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustMode {
    /// Full verification: discovery issuer must match, signatures are checked.
    Strict,
    /// The discovery document may advertise a different issuer (local
    /// issuers reached through another hostname). Signatures are checked.
    SkipIssuerVerification,
    /// Issuer mismatch tolerated and signatures are not checked.
    /// Development issuers only.
    Insecure,
}

impl TrustMode {
    /// Derive the trust mode from the two independent opt-in flags.
    ///
    /// # Errors
    ///
    /// Skipping signatures without also skipping issuer verification is
    /// rejected as [`ProviderError::InvalidProviderConfig`].
    pub fn from_flags(skip_issuer_verify: bool, skip_signature_verify: bool) -> Result<Self, ProviderError> {
        match (skip_issuer_verify, skip_signature_verify) {
            (false, false) => Ok(Self::Strict),
            (true, false) => Ok(Self::SkipIssuerVerification),
            (true, true) => Ok(Self::Insecure),
            (false, true) => Err(ProviderError::InvalidProviderConfig(
                "skip_signature_verify requires skip_issuer_verify".to_string(),
            )),
        }
    }

    /// True when discovery issuer mismatches are tolerated.
    #[must_use]
    pub fn skips_issuer_check(self) -> bool {
        !matches!(self, Self::Strict)
    }

    /// True when token signatures are not checked.
    #[must_use]
    pub fn skips_signature(self) -> bool {
        matches!(self, Self::Insecure)
    }
}

impl fmt::Display for TrustMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strict => "strict",
            Self::SkipIssuerVerification => "skip-issuer-verification",
            Self::Insecure => "insecure",
        })
    }
}

/// Explicit registration of one provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Issuer URL; also the registry key
    pub issuer: String,
    /// Accepted client IDs / audiences, in preference order
    pub audiences: Vec<String>,
    /// Tolerate a discovery document advertising another issuer
    pub skip_issuer_verify: bool,
    /// Disable signature checks (requires `skip_issuer_verify`)
    pub skip_signature_verify: bool,
    /// JWKS endpoint override; defaults to the discovered `jwks_uri`
    pub jwks_uri: Option<String>,
}

impl ProviderConfig {
    /// Trust mode requested by this configuration.
    pub fn trust_mode(&self) -> Result<TrustMode, ProviderError> {
        TrustMode::from_flags(self.skip_issuer_verify, self.skip_signature_verify)
    }
}

/// The environment-derived default provider
/// (`OIDC_PROVIDER`, `OIDC_CLIENT_ID`, `OIDC_DEVICE_CLIENT_ID`, `OIDC_SKIP_ISSUER_VERIFY`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultProviderSettings {
    /// Issuer URL of the default provider
    pub issuer: Option<String>,
    /// Web client ID
    pub client_id: Option<String>,
    /// Device-flow client ID
    pub device_client_id: Option<String>,
    /// Tolerate a discovery issuer mismatch (development only)
    pub skip_issuer_verify: bool,
}

impl DefaultProviderSettings {
    /// Build the provider configuration, or `None` when no issuer is set.
    ///
    /// # Errors
    ///
    /// [`ProviderError::NoClientIDsConfigured`] if an issuer is set but
    /// neither client ID is.
    pub fn to_provider_config(&self) -> Result<Option<ProviderConfig>, ProviderError> {
        let Some(issuer) = self.issuer.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        let audiences: Vec<String> = [&self.client_id, &self.device_client_id]
            .into_iter()
            .flatten()
            .filter(|id| !id.is_empty())
            .cloned()
            .collect();
        if audiences.is_empty() {
            return Err(ProviderError::NoClientIDsConfigured);
        }

        Ok(Some(ProviderConfig {
            issuer: issuer.to_string(),
            audiences,
            skip_issuer_verify: self.skip_issuer_verify,
            skip_signature_verify: false,
            jwks_uri: None,
        }))
    }
}

/// Verification tunables shared by every discovered provider.
#[derive(Debug, Clone, Copy)]
pub struct VerifierOptions {
    /// Clock-skew tolerance for `exp`/`nbf`
    pub leeway_secs: u64,
    /// JWKS cache lifetime
    pub jwks_cache_ttl: Duration,
    /// Minimum spacing between unknown-`kid` refetches
    pub jwks_min_refresh_interval: Duration,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            leeway_secs: DEFAULT_LEEWAY_SECS,
            jwks_cache_ttl: DEFAULT_JWKS_TTL,
            jwks_min_refresh_interval: MIN_REFRESH_INTERVAL,
        }
    }
}

/// One external identity provider.
///
/// Immutable once constructed and shared read-only across requests.
pub struct Provider {
    issuer: String,
    audiences: Vec<String>,
    trust_mode: TrustMode,
    verifier: Arc<dyn TokenVerifier>,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("issuer", &self.issuer)
            .field("audiences", &self.audiences)
            .field("trust_mode", &self.trust_mode)
            .finish_non_exhaustive()
    }
}

impl Provider {
    /// Assemble a provider around an existing verifier and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidProviderConfig`] if validation fails.
    pub fn new(
        issuer: impl Into<String>,
        audiences: Vec<String>,
        trust_mode: TrustMode,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Result<Self, ProviderError> {
        let provider = Self {
            issuer: issuer.into(),
            audiences,
            trust_mode,
            verifier,
        };
        provider.verify_config()?;
        Ok(provider)
    }

    /// Discover `config.issuer` and build a JWKS-backed provider.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::InvalidProviderConfig`] for inconsistent flags,
    ///   an unusable issuer URL, no audiences, or no JWKS endpoint
    /// - [`ProviderError::ProviderDiscoveryFailed`] if discovery fails
    pub async fn discover(
        http: &Client,
        config: &ProviderConfig,
        options: VerifierOptions,
    ) -> Result<Self, ProviderError> {
        let trust_mode = config.trust_mode()?;
        validate_issuer_url(&config.issuer)?;
        if config.audiences.is_empty() {
            return Err(ProviderError::InvalidProviderConfig(format!(
                "no audiences configured for {}",
                config.issuer
            )));
        }

        if trust_mode != TrustMode::Strict {
            warn!(issuer = %config.issuer, mode = %trust_mode, "OIDC provider uses relaxed verification");
        } else if !config.issuer.starts_with("https://") {
            warn!(issuer = %config.issuer, "OIDC issuer is not HTTPS");
        }

        let metadata = ProviderMetadata::discover(http, &config.issuer, trust_mode).await?;
        let jwks_uri = config
            .jwks_uri
            .clone()
            .or(metadata.jwks_uri)
            .ok_or_else(|| {
                ProviderError::InvalidProviderConfig(format!(
                    "no jwks_uri for {}: verifier cannot be built",
                    config.issuer
                ))
            })?;

        let keys = JwksCache::new(http.clone(), jwks_uri, options.jwks_cache_ttl)
            .with_min_refresh_interval(options.jwks_min_refresh_interval);
        let verifier = JwksVerifier::new(config.issuer.clone(), trust_mode, keys)
            .with_leeway(options.leeway_secs);

        let provider = Self::new(
            config.issuer.clone(),
            config.audiences.clone(),
            trust_mode,
            Arc::new(verifier),
        )?;
        info!(issuer = %provider.issuer, audiences = ?provider.audiences, mode = %trust_mode, "OIDC provider ready");
        Ok(provider)
    }

    /// Reject a provider with an empty issuer or no accepted audiences.
    ///
    /// The verifier capability is required by construction.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidProviderConfig`] describing the defect.
    pub fn verify_config(&self) -> Result<(), ProviderError> {
        if self.issuer.is_empty() {
            return Err(ProviderError::InvalidProviderConfig(
                "provider URI is empty".to_string(),
            ));
        }
        if self.audiences.is_empty() || self.audiences.iter().any(String::is_empty) {
            return Err(ProviderError::InvalidProviderConfig(format!(
                "provider {} has no usable audiences",
                self.issuer
            )));
        }
        Ok(())
    }

    /// Issuer URI (registry key).
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Accepted audiences in preference order.
    #[must_use]
    pub fn audiences(&self) -> &[String] {
        &self.audiences
    }

    /// Trust mode of this provider.
    #[must_use]
    pub fn trust_mode(&self) -> TrustMode {
        self.trust_mode
    }

    /// First accepted audience that appears in `token_audience`.
    #[must_use]
    pub fn match_audience(&self, token_audience: &[String]) -> Option<&str> {
        self.audiences
            .iter()
            .find(|accepted| token_audience.contains(accepted))
            .map(String::as_str)
    }

    /// Verify `token` for `audience` with this provider's verifier.
    pub async fn verify(&self, token: &str, audience: &str) -> Result<Value, VerifyError> {
        self.verifier.verify(token, audience).await
    }
}

fn validate_issuer_url(issuer: &str) -> Result<(), ProviderError> {
    if issuer.is_empty() {
        return Err(ProviderError::InvalidProviderConfig(
            "provider URI is empty".to_string(),
        ));
    }
    let url = Url::parse(issuer).map_err(|e| {
        ProviderError::InvalidProviderConfig(format!("invalid issuer URL {issuer}: {e}"))
    })?;
    if !matches!(url.scheme(), "https" | "http") {
        return Err(ProviderError::InvalidProviderConfig(format!(
            "unsupported issuer scheme in {issuer}"
        )));
    }
    Ok(())
}
