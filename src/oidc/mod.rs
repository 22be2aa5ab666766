//! OpenID Connect providers and token verification.
//!
//! ```text
//! ProviderConfig / DefaultProviderSettings
//!   -> discovery (/.well-known/openid-configuration)
//!   -> JwksVerifier (JWKS cache + signature/claim checks)
//!   -> Provider (issuer, audiences, trust mode, verifier)
//!   -> ProviderRegistry (exact issuer lookup)
//! ```

pub mod claims;
pub mod discovery;
mod error;
pub mod jwks;
pub mod loader;
pub mod provider;
pub mod registry;
pub mod verifier;

pub use claims::{UnverifiedClaims, parse_unverified};
pub use error::{ProviderError, VerifyError};
pub use jwks::JwksCache;
pub use loader::{http_client, load_providers};
pub use provider::{DefaultProviderSettings, Provider, ProviderConfig, TrustMode, VerifierOptions};
pub use registry::ProviderRegistry;
pub use verifier::{JwksVerifier, TokenVerifier};
