//! ROR Auth Library
//!
//! Multi-issuer OpenID Connect authentication for the ROR control-plane API.
//!
//! # Features
//!
//! - **Provider registry**: exact-issuer routing, no fallback trust root
//! - **Verification**: JWKS-cached signature, issuer, audience and lifetime checks
//! - **Identity**: domain-qualified platform groups, published per request
//! - **axum middleware**: 401 short-circuit with audit events
//!
//! # Flow
//!
//! ```text
//! Authorization: Bearer <JWT>
//!   -> unverified iss/aud (routing only)
//!   -> ProviderRegistry (exact issuer)
//!   -> Provider verifier (signature, iss, aud, exp, nbf)
//!   -> groups "<group>@<email-domain>"
//!   -> Identity in request extensions
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod oidc;
pub mod server;

pub use error::{Error, Result};
pub use ror_identity::{AuthInfo, AuthProvider, Identity, IdentityType, User};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| Error::Internal(e.to_string())),
        _ => subscriber
            .with(fmt::layer())
            .try_init()
            .map_err(|e| Error::Internal(e.to_string())),
    }
}
