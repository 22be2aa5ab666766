//! OpenID Connect discovery (`/.well-known/openid-configuration`).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ProviderError;
use super::provider::TrustMode;

/// The subset of the OIDC provider metadata document used for verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// Issuer identifier advertised by the provider
    pub issuer: String,

    /// JWKS endpoint
    #[serde(default)]
    pub jwks_uri: Option<String>,

    /// Signing algorithms the provider may use for ID tokens
    #[serde(default)]
    pub id_token_signing_alg_values_supported: Vec<String>,
}

/// Discovery URL for an issuer.
pub fn discovery_url(issuer: &str) -> String {
    format!(
        "{}/.well-known/openid-configuration",
        issuer.trim_end_matches('/')
    )
}

impl ProviderMetadata {
    /// Fetch and validate the discovery document for `issuer`.
    ///
    /// Under [`TrustMode::Strict`] the advertised `issuer` must equal the
    /// configured one. The relaxed modes log the mismatch and continue.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::ProviderDiscoveryFailed`] if the document is
    /// unreachable, not JSON, or advertises a different issuer in strict mode.
    pub async fn discover(
        client: &Client,
        issuer: &str,
        trust_mode: TrustMode,
    ) -> Result<Self, ProviderError> {
        let url = discovery_url(issuer);
        debug!(url = %url, "Discovering OIDC provider metadata");

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::discovery(issuer, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ProviderError::discovery(
                issuer,
                format!("HTTP {}", response.status()),
            ));
        }

        let metadata: Self = response
            .json()
            .await
            .map_err(|e| ProviderError::discovery(issuer, format!("invalid document: {e}")))?;

        metadata.check_issuer(issuer, trust_mode)?;

        debug!(issuer = %metadata.issuer, jwks_uri = ?metadata.jwks_uri, "Discovered OIDC provider");
        Ok(metadata)
    }

    fn check_issuer(&self, configured: &str, trust_mode: TrustMode) -> Result<(), ProviderError> {
        if self.issuer == configured {
            return Ok(());
        }
        if trust_mode.skips_issuer_check() {
            warn!(
                configured = %configured,
                advertised = %self.issuer,
                "Discovery issuer mismatch tolerated (issuer verification disabled)"
            );
            return Ok(());
        }
        Err(ProviderError::discovery(
            configured,
            format!(
                "issuer did not match the issuer returned by provider, expected \"{configured}\" got \"{}\"",
                self.issuer
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(issuer: &str) -> ProviderMetadata {
        serde_json::from_value(serde_json::json!({
            "issuer": issuer,
            "jwks_uri": format!("{issuer}/keys"),
        }))
        .unwrap()
    }

    #[test]
    fn discovery_url_appends_well_known() {
        assert_eq!(
            discovery_url("https://idp.example.com"),
            "https://idp.example.com/.well-known/openid-configuration"
        );
        assert_eq!(
            discovery_url("https://idp.example.com/realms/ror/"),
            "https://idp.example.com/realms/ror/.well-known/openid-configuration"
        );
    }

    #[test]
    fn minimal_document_parses() {
        let meta: ProviderMetadata =
            serde_json::from_str(r#"{"issuer": "https://idp.example.com"}"#).unwrap();
        assert!(meta.jwks_uri.is_none());
        assert!(meta.id_token_signing_alg_values_supported.is_empty());
    }

    #[test]
    fn strict_mode_rejects_issuer_mismatch() {
        let meta = metadata("http://dex:5556/dex");

        let err = meta
            .check_issuer("http://localhost:5556/dex", TrustMode::Strict)
            .unwrap_err();

        assert!(matches!(err, ProviderError::ProviderDiscoveryFailed { .. }));
    }

    #[test]
    fn relaxed_modes_tolerate_issuer_mismatch() {
        let meta = metadata("http://dex:5556/dex");

        assert!(meta
            .check_issuer("http://localhost:5556/dex", TrustMode::SkipIssuerVerification)
            .is_ok());
        assert!(meta
            .check_issuer("http://localhost:5556/dex", TrustMode::Insecure)
            .is_ok());
    }

    #[test]
    fn matching_issuer_is_accepted() {
        let meta = metadata("https://idp.example.com");
        assert!(meta.check_issuer("https://idp.example.com", TrustMode::Strict).is_ok());
    }
}
