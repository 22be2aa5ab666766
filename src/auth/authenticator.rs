//! Bearer token to [`Identity`] pipeline.
//!
//! ```text
//! header -> bearer token -> unverified claims -> provider (exact issuer)
//!        -> audience match -> verified claims -> groups -> Identity
//! ```
//!
//! Any step may reject. Nothing read before verification is trusted: the
//! unverified issuer and audience only pick the provider and the audience
//! handed to its verifier.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ror_identity::{Identity, User};
use serde::Deserialize;
use tracing::debug;

use super::AuthError;
use super::groups::resolve_groups;
use crate::oidc::{ProviderRegistry, UnverifiedClaims, parse_unverified};

/// Default upper bound for a single token verification.
pub const DEFAULT_VERIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Claims required from a verified token.
#[derive(Debug, Deserialize)]
struct PrincipalClaims {
    email: String,
    #[serde(default)]
    groups: Vec<String>,
    exp: i64,
}

/// Turns bearer tokens into identities using a shared [`ProviderRegistry`].
///
/// Stateless per call; clone the `Arc` to share across requests.
#[derive(Debug)]
pub struct Authenticator {
    registry: Arc<ProviderRegistry>,
    verification_timeout: Duration,
}

impl Authenticator {
    /// Create an authenticator over `registry`.
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            verification_timeout: DEFAULT_VERIFICATION_TIMEOUT,
        }
    }

    /// Bound each verification (key fetches included) by `timeout`.
    #[must_use]
    pub fn with_verification_timeout(mut self, timeout: Duration) -> Self {
        self.verification_timeout = timeout;
        self
    }

    /// The registry consulted for every token.
    #[must_use]
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Strip the `Bearer ` prefix (case-sensitive) from an `Authorization` value.
    ///
    /// # Errors
    ///
    /// [`AuthError::MissingAuthHeader`] for `None`, [`AuthError::NotBearerScheme`]
    /// for any other scheme.
    pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
        let header = header.ok_or(AuthError::MissingAuthHeader)?;
        header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::NotBearerScheme)
    }

    /// Authenticate a raw `Authorization` header value.
    ///
    /// # Errors
    ///
    /// See [`Authenticator::authenticate`]; also rejects missing headers and
    /// non-Bearer schemes.
    pub async fn authenticate_header(&self, header: Option<&str>) -> Result<Identity, AuthError> {
        let token = Self::extract_bearer(header)?;
        self.authenticate(token).await
    }

    /// Authenticate a bearer token.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] of the first failing step. No verifier is
    /// invoked unless the issuer is registered and an accepted audience is
    /// present.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        self.authenticate_with_issuer(token).await.0
    }

    /// Authenticate a bearer token and also return the issuer it claimed.
    ///
    /// The issuer is read once, before verification, and is `None` when the
    /// token cannot be parsed. It is only fit for audit records.
    pub async fn authenticate_with_issuer(
        &self,
        token: &str,
    ) -> (Result<Identity, AuthError>, Option<String>) {
        match parse_unverified(token) {
            Ok(unverified) => {
                let result = self.authenticate_unverified(token, &unverified).await;
                (result, Some(unverified.issuer))
            }
            Err(e) => (Err(e), None),
        }
    }

    async fn authenticate_unverified(
        &self,
        token: &str,
        unverified: &UnverifiedClaims,
    ) -> Result<Identity, AuthError> {
        let provider = self
            .registry
            .get_provider_by_url(&unverified.issuer)
            .ok_or_else(|| AuthError::UnknownIssuer(unverified.issuer.clone()))?;

        let audience = provider
            .match_audience(&unverified.audience)
            .ok_or_else(|| AuthError::AudienceMismatch(unverified.issuer.clone()))?;

        let claims = tokio::time::timeout(self.verification_timeout, provider.verify(token, audience))
            .await
            .map_err(|_| AuthError::VerificationTimeout)?
            .map_err(|e| {
                debug!(issuer = %unverified.issuer, error = %e, "Token verification failed");
                AuthError::from(e)
            })?;

        let principal: PrincipalClaims = serde_json::from_value(claims)
            .map_err(|e| AuthError::ClaimsDecodeError(e.to_string()))?;
        let expiration = DateTime::<Utc>::from_timestamp(principal.exp, 0).ok_or_else(|| {
            AuthError::ClaimsDecodeError(format!("exp out of range: {}", principal.exp))
        })?;

        let groups = resolve_groups(&principal.email, &principal.groups)?;

        let user = User {
            email: principal.email,
            groups,
            expiration_time: principal.exp,
        };
        Ok(Identity::oidc_user(user, expiration).with_token(token))
    }
}
