//! Error taxonomies for provider construction and token verification.

/// Startup-time provider construction failures.
///
/// A provider that fails with one of these is logged and left out of the
/// registry; its tokens then degrade to an unknown-issuer rejection.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The discovery document could not be fetched, parsed, or trusted.
    #[error("OIDC discovery failed for {issuer}: {reason}")]
    ProviderDiscoveryFailed {
        /// Issuer URL that was being discovered
        issuer: String,
        /// What went wrong
        reason: String,
    },

    /// Neither a client ID nor a device client ID is configured.
    #[error("No OIDC client IDs configured")]
    NoClientIDsConfigured,

    /// The provider failed post-construction validation.
    #[error("Invalid provider configuration: {0}")]
    InvalidProviderConfig(String),
}

impl ProviderError {
    pub(crate) fn discovery(issuer: &str, reason: impl Into<String>) -> Self {
        Self::ProviderDiscoveryFailed {
            issuer: issuer.to_string(),
            reason: reason.into(),
        }
    }
}

/// Verifier failures. Internal diagnostics only; never returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// `exp` has passed.
    #[error("token expired")]
    Expired,

    /// `nbf` is in the future.
    #[error("token not yet valid")]
    NotYetValid,

    /// Signature does not verify against the provider key.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// `iss` is not the provider's issuer.
    #[error("issuer mismatch")]
    InvalidIssuer,

    /// `aud` does not contain the expected audience.
    #[error("audience mismatch")]
    InvalidAudience,

    /// JWS algorithm outside the asymmetric allow-list.
    #[error("unsupported JWT algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Header carries no `kid` and the key set is ambiguous.
    #[error("JWT missing 'kid' field in header")]
    MissingKeyId,

    /// `kid` not present in the provider key set, even after refresh.
    #[error("unknown key ID: {0}")]
    UnknownKeyId(String),

    /// Key set could not be fetched.
    #[error("JWKS fetch error: {0}")]
    KeyFetch(String),

    /// Token structure or claim types are invalid.
    #[error("malformed token: {0}")]
    Malformed(String),
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidIssuer => Self::InvalidIssuer,
            ErrorKind::InvalidAudience => Self::InvalidAudience,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::UnsupportedAlgorithm(err.to_string())
            }
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
            | ErrorKind::MissingRequiredClaim(_) => Self::Malformed(err.to_string()),
            _ => Self::InvalidSignature(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for VerifyError {
    fn from(err: reqwest::Error) -> Self {
        Self::KeyFetch(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::{Error as JwtError, ErrorKind};

    #[test]
    fn jwt_errors_map_to_verify_errors() {
        assert!(matches!(
            VerifyError::from(JwtError::from(ErrorKind::ExpiredSignature)),
            VerifyError::Expired
        ));
        assert!(matches!(
            VerifyError::from(JwtError::from(ErrorKind::ImmatureSignature)),
            VerifyError::NotYetValid
        ));
        assert!(matches!(
            VerifyError::from(JwtError::from(ErrorKind::InvalidAudience)),
            VerifyError::InvalidAudience
        ));
        assert!(matches!(
            VerifyError::from(JwtError::from(ErrorKind::InvalidSignature)),
            VerifyError::InvalidSignature(_)
        ));
    }

    #[test]
    fn discovery_error_names_issuer() {
        let err = ProviderError::discovery("https://idp.example.com", "HTTP 404");
        assert_eq!(
            err.to_string(),
            "OIDC discovery failed for https://idp.example.com: HTTP 404"
        );
    }
}
