//! Per-provider JWKS cache.
//!
//! Keys are fetched lazily on first use, cached for `ttl`, and refreshed when
//! a token names a `kid` the cached set does not contain. Refreshes are
//! serialized per provider and an unknown `kid` cannot trigger more than one
//! fetch per `min_refresh_interval`. A fetched set replaces the previous one
//! in a single pointer swap.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::{AlgorithmParameters, JwkSet};
use parking_lot::RwLock;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::debug;

use super::VerifyError;

/// Default lifetime of a fetched key set.
pub const DEFAULT_JWKS_TTL: Duration = Duration::from_secs(3600);

/// Minimum spacing between refreshes caused by unknown key IDs.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

struct CachedJwks {
    keys: JwkSet,
    fetched_at: Instant,
}

/// JWKS cache for a single provider.
pub struct JwksCache {
    jwks_uri: String,
    http: Client,
    ttl: Duration,
    min_refresh_interval: Duration,
    cached: RwLock<Option<Arc<CachedJwks>>>,
    refresh: Mutex<()>,
}

impl JwksCache {
    /// Create an empty cache for `jwks_uri`.
    #[must_use]
    pub fn new(http: Client, jwks_uri: impl Into<String>, ttl: Duration) -> Self {
        Self {
            jwks_uri: jwks_uri.into(),
            http,
            ttl,
            min_refresh_interval: MIN_REFRESH_INTERVAL,
            cached: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Override the unknown-`kid` refresh spacing.
    #[must_use]
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// JWKS endpoint this cache reads from.
    #[must_use]
    pub fn jwks_uri(&self) -> &str {
        &self.jwks_uri
    }

    fn current(&self) -> Option<Arc<CachedJwks>> {
        self.cached.read().clone()
    }

    /// Resolve the verification key for `kid`, fetching the key set if needed.
    ///
    /// # Errors
    ///
    /// - [`VerifyError::KeyFetch`] if the key set cannot be fetched
    /// - [`VerifyError::MissingKeyId`] if `kid` is absent and the set has
    ///   more than one key
    /// - [`VerifyError::UnknownKeyId`] if no usable key matches
    pub async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, VerifyError> {
        if let Some(cached) = self.current()
            && cached.fetched_at.elapsed() < self.ttl
            && let Some(key) = select_key(&cached.keys, kid)?
        {
            return Ok(key);
        }

        let _guard = self.refresh.lock().await;

        // A concurrent caller may have refreshed while we waited.
        if let Some(cached) = self.current()
            && cached.fetched_at.elapsed() < self.ttl
        {
            if let Some(key) = select_key(&cached.keys, kid)? {
                return Ok(key);
            }
            if cached.fetched_at.elapsed() < self.min_refresh_interval {
                return Err(unknown_key(kid));
            }
        }

        let fresh = self.fetch().await?;
        select_key(&fresh.keys, kid)?.ok_or_else(|| unknown_key(kid))
    }

    async fn fetch(&self) -> Result<Arc<CachedJwks>, VerifyError> {
        debug!(jwks_uri = %self.jwks_uri, "Fetching JWKS");
        let keys: JwkSet = self
            .http
            .get(&self.jwks_uri)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let fresh = Arc::new(CachedJwks {
            keys,
            fetched_at: Instant::now(),
        });
        *self.cached.write() = Some(Arc::clone(&fresh));
        Ok(fresh)
    }
}

fn unknown_key(kid: Option<&str>) -> VerifyError {
    VerifyError::UnknownKeyId(kid.unwrap_or("<none>").to_string())
}

/// Pick the key for `kid`. Without a `kid`, a single-key set is unambiguous.
fn select_key(jwks: &JwkSet, kid: Option<&str>) -> Result<Option<DecodingKey>, VerifyError> {
    match kid {
        Some(kid) => Ok(jwks
            .keys
            .iter()
            .find(|jwk| jwk.common.key_id.as_deref() == Some(kid))
            .and_then(|jwk| to_decoding_key(&jwk.algorithm))),
        None => match jwks.keys.as_slice() {
            [only] => Ok(to_decoding_key(&only.algorithm)),
            [] => Ok(None),
            _ => Err(VerifyError::MissingKeyId),
        },
    }
}

/// Only asymmetric keys can verify provider tokens.
fn to_decoding_key(params: &AlgorithmParameters) -> Option<DecodingKey> {
    match params {
        AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e).ok(),
        AlgorithmParameters::EllipticCurve(ec) => {
            DecodingKey::from_ec_components(&ec.x, &ec.y).ok()
        }
        AlgorithmParameters::OctetKey(_) | AlgorithmParameters::OctetKeyPair(_) => None,
    }
}
