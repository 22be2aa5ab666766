//! ROR identity model
//!
//! The canonical principal produced by authentication and consumed by the
//! ACL engine and business services. This crate carries only the data model
//! so that downstream services can depend on it without pulling in the
//! token verification stack.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of principal behind an [`Identity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityType {
    /// A human user authenticated through an identity provider
    User,
    /// A service principal (machine-to-machine)
    Service,
}

/// Mechanism that authenticated the principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum AuthProvider {
    /// OpenID Connect bearer token
    Oidc,
}

/// Authentication facts about an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInfo {
    /// Mechanism that authenticated the principal
    pub provider: AuthProvider,
    /// Principal ID as known by the provider (the email for OIDC users)
    pub provider_principal_id: String,
    /// When the presented credential stops being valid
    pub expiration: DateTime<Utc>,
}

/// Decoded principal claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Email address of the principal
    pub email: String,
    /// Platform group identifiers (`<group>@<domain>`)
    pub groups: Vec<String>,
    /// Credential expiry (unix seconds)
    pub expiration_time: i64,
}

impl User {
    /// Returns true if the user is a member of `group`.
    #[must_use]
    pub fn is_member_of(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

/// The authenticated principal attached to a request.
///
/// Created fresh for every successful authentication and never persisted.
/// The raw bearer token is kept for propagation to other services on the
/// principal's behalf but is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Principal kind
    #[serde(rename = "type")]
    pub identity_type: IdentityType,
    /// How the principal was authenticated
    pub auth: AuthInfo,
    /// User claims, present for [`IdentityType::User`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip)]
    token: Option<String>,
}

impl Identity {
    /// Build a user identity authenticated through OIDC.
    #[must_use]
    pub fn oidc_user(user: User, expiration: DateTime<Utc>) -> Self {
        Self {
            identity_type: IdentityType::User,
            auth: AuthInfo {
                provider: AuthProvider::Oidc,
                provider_principal_id: user.email.clone(),
                expiration,
            },
            user: Some(user),
            token: None,
        }
    }

    /// Attach the raw bearer token the identity was derived from.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Raw bearer token, if one was attached.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Principal ID as known by the authenticating provider.
    #[must_use]
    pub fn principal_id(&self) -> &str {
        &self.auth.provider_principal_id
    }

    /// Group memberships, empty for identities without user claims.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        self.user.as_ref().map(|u| u.groups.as_slice()).unwrap_or_default()
    }

    /// Returns true once `now` has passed the credential expiry.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.auth.expiration
    }

    /// Returns true if this is a human user.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.identity_type == IdentityType::User
    }
}
