//! Token verification capability.
//!
//! # Verification flow
//!
//! 1. Decode the JWT header to read `alg` and `kid`.
//! 2. Reject anything but asymmetric JWS algorithms.
//! 3. Resolve the key from the provider's JWKS (cached, refreshed on unknown `kid`).
//! 4. Verify the signature and `iss`, `aud`, `exp`, `nbf` with clock leeway.
//!
//! [`TrustMode::Insecure`] skips steps 1-3 and checks only the registered
//! claims. It exists for local development issuers.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, Validation};
use serde_json::Value;

use super::jwks::JwksCache;
use super::provider::TrustMode;
use super::{VerifyError, claims};

/// Default clock-skew tolerance in seconds.
pub const DEFAULT_LEEWAY_SECS: u64 = 60;

/// Verifies a raw token for one expected audience.
///
/// Implementations are bound to a single provider and must check the
/// signature, issuer, audience, expiry and not-before before returning claims.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` for `audience` and return its decoded claims.
    async fn verify(&self, token: &str, audience: &str) -> Result<Value, VerifyError>;
}

/// JWKS-backed verifier for an OIDC provider.
pub struct JwksVerifier {
    issuer: String,
    trust_mode: TrustMode,
    leeway: u64,
    keys: JwksCache,
}

impl JwksVerifier {
    /// Create a verifier for `issuer` reading keys through `keys`.
    #[must_use]
    pub fn new(issuer: impl Into<String>, trust_mode: TrustMode, keys: JwksCache) -> Self {
        Self {
            issuer: issuer.into(),
            trust_mode,
            leeway: DEFAULT_LEEWAY_SECS,
            keys,
        }
    }

    /// Override the clock-skew tolerance.
    #[must_use]
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway = leeway_secs;
        self
    }

    fn validation(&self, alg: Algorithm, audience: &str) -> Validation {
        let mut v = Validation::new(alg);
        v.leeway = self.leeway;
        v.validate_nbf = true;
        v.set_audience(&[audience]);
        v.set_issuer(&[self.issuer.as_str()]);
        v
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str, audience: &str) -> Result<Value, VerifyError> {
        if self.trust_mode.skips_signature() {
            let claims = claims::payload_bytes(token)
                .and_then(|b| serde_json::from_slice::<Value>(&b).ok())
                .ok_or_else(|| VerifyError::Malformed("payload is not base64url JSON".into()))?;
            check_registered_claims(
                &claims,
                &self.issuer,
                audience,
                self.leeway,
                chrono::Utc::now().timestamp(),
            )?;
            return Ok(claims);
        }

        let header = jsonwebtoken::decode_header(token)?;
        let alg = allowed_algorithm(header.alg)?;
        let key = self.keys.decoding_key(header.kid.as_deref()).await?;

        let data = jsonwebtoken::decode::<Value>(token, &key, &self.validation(alg, audience))?;
        Ok(data.claims)
    }
}

/// Asymmetric algorithms only; `none` and HMAC never verify provider tokens.
fn allowed_algorithm(alg: Algorithm) -> Result<Algorithm, VerifyError> {
    match alg {
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512
        | Algorithm::ES256
        | Algorithm::ES384 => Ok(alg),
        other => Err(VerifyError::UnsupportedAlgorithm(format!("{other:?}"))),
    }
}

/// Check `iss`, `aud`, `exp` and `nbf` on already-decoded claims.
fn check_registered_claims(
    claims: &Value,
    issuer: &str,
    audience: &str,
    leeway: u64,
    now: i64,
) -> Result<(), VerifyError> {
    let leeway = i64::try_from(leeway).unwrap_or(i64::MAX);

    let exp = claims
        .get("exp")
        .and_then(Value::as_i64)
        .ok_or_else(|| VerifyError::Malformed("missing or non-integer exp".into()))?;
    if exp < now.saturating_sub(leeway) {
        return Err(VerifyError::Expired);
    }

    if let Some(nbf) = claims.get("nbf") {
        let nbf = nbf
            .as_i64()
            .ok_or_else(|| VerifyError::Malformed("non-integer nbf".into()))?;
        if nbf > now.saturating_add(leeway) {
            return Err(VerifyError::NotYetValid);
        }
    }

    if claims.get("iss").and_then(Value::as_str) != Some(issuer) {
        return Err(VerifyError::InvalidIssuer);
    }

    let aud_matches = match claims.get("aud") {
        Some(Value::String(s)) => s == audience,
        Some(Value::Array(values)) => values.iter().any(|v| v.as_str() == Some(audience)),
        _ => false,
    };
    if !aud_matches {
        return Err(VerifyError::InvalidAudience);
    }

    Ok(())
}
