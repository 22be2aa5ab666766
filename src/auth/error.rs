//! Per-request authentication failures.

use axum::http::StatusCode;
use thiserror::Error;

use crate::oidc::VerifyError;

/// Why a request was rejected.
///
/// Every variant is surfaced to the caller as `401 Unauthorized` with the
/// [`code`](AuthError::code) and [`public_message`](AuthError::public_message);
/// verifier internals are logged, never returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header
    #[error("missing Authorization header")]
    MissingAuthHeader,
    /// Header present but not `Bearer <token>`
    #[error("Authorization header is not a Bearer credential")]
    NotBearerScheme,
    /// Token is not a decodable JWT
    #[error("malformed token")]
    MalformedToken,
    /// `iss` absent or empty
    #[error("token has no issuer")]
    MissingIssuer,
    /// `aud` absent or empty
    #[error("token has no audience")]
    MissingAudience,
    /// No provider registered for the claimed issuer
    #[error("unknown issuer {0}")]
    UnknownIssuer(String),
    /// Token audience does not overlap the provider's accepted audiences
    #[error("no accepted audience for issuer {0}")]
    AudienceMismatch(String),
    /// Signature, issuer, audience or key material rejected by the verifier
    #[error("token verification failed: {0}")]
    SignatureInvalid(String),
    /// `exp` in the past
    #[error("token expired")]
    TokenExpired,
    /// `nbf` in the future
    #[error("token not yet valid")]
    TokenNotYetValid,
    /// Verification did not finish before the deadline
    #[error("token verification timed out")]
    VerificationTimeout,
    /// Verified claims do not contain a usable principal
    #[error("cannot decode token claims: {0}")]
    ClaimsDecodeError(String),
    /// Email claim does not contain exactly one `@` followed by a domain
    #[error("invalid email format")]
    InvalidEmailFormat,
    /// Principal has no groups after resolution
    #[error("no groups resolved for principal")]
    NoGroupsResolved,
}

impl AuthError {
    /// Stable machine-readable rejection code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingAuthHeader => "missing_auth_header",
            Self::NotBearerScheme => "not_bearer_scheme",
            Self::MalformedToken => "malformed_token",
            Self::MissingIssuer => "missing_issuer",
            Self::MissingAudience => "missing_audience",
            Self::UnknownIssuer(_) => "unknown_issuer",
            Self::AudienceMismatch(_) => "audience_mismatch",
            Self::SignatureInvalid(_) => "signature_invalid",
            Self::TokenExpired => "token_expired",
            Self::TokenNotYetValid => "token_not_yet_valid",
            Self::VerificationTimeout => "verification_timeout",
            Self::ClaimsDecodeError(_) => "claims_decode_error",
            Self::InvalidEmailFormat => "invalid_email_format",
            Self::NoGroupsResolved => "no_groups_resolved",
        }
    }

    /// Message safe to return to the caller.
    ///
    /// Carries the reason category only: no issuer names, verifier
    /// diagnostics or key identifiers.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingAuthHeader => {
                "Missing Authorization header. Use: Authorization: Bearer <token>"
            }
            Self::NotBearerScheme => "Authorization header must use the Bearer scheme",
            Self::MalformedToken | Self::MissingIssuer | Self::MissingAudience => {
                "Malformed bearer token"
            }
            Self::UnknownIssuer(_) | Self::AudienceMismatch(_) => {
                "Token was not issued for this service"
            }
            Self::SignatureInvalid(_) | Self::VerificationTimeout => "Invalid token",
            Self::TokenExpired => "Token expired",
            Self::TokenNotYetValid => "Token not yet valid",
            Self::ClaimsDecodeError(_) | Self::InvalidEmailFormat => {
                "Token does not identify a valid principal"
            }
            Self::NoGroupsResolved => "Principal has no groups",
        }
    }

    /// HTTP status for this rejection.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl From<VerifyError> for AuthError {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::Expired => Self::TokenExpired,
            VerifyError::NotYetValid => Self::TokenNotYetValid,
            other => Self::SignatureInvalid(other.to_string()),
        }
    }
}
