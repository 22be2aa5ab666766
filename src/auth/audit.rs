//! Audit logging for authentication outcomes.
//!
//! Every event is emitted via `tracing::info!` with the serialized event in
//! the `audit` field. Raw tokens are never included.
//!
//! # Events
//!
//! | Event | When |
//! |-------|------|
//! | `auth.authenticated` | A bearer token produced an identity |
//! | `auth.rejected` | The request was rejected with 401 |

use serde::Serialize;
use ror_identity::Identity;

use super::AuthError;

/// Structured audit event for one authentication attempt.
#[derive(Debug, Serialize)]
pub struct AuditEvent {
    /// Event type string (`"auth.authenticated"` or `"auth.rejected"`).
    pub event: &'static str,
    /// Principal ID (authenticated events).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
    /// Issuer claimed by the token, when it could be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// Resolved platform groups (authenticated events).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    /// Rejection code (rejected events).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    /// Request path.
    pub path: String,
}

impl AuditEvent {
    /// Construct an `auth.authenticated` event.
    #[must_use]
    pub fn authenticated(identity: &Identity, issuer: Option<String>, path: &str) -> Self {
        Self {
            event: "auth.authenticated",
            principal: Some(identity.principal_id().to_string()),
            issuer,
            groups: Some(identity.groups().to_vec()),
            reason: None,
            path: path.to_string(),
        }
    }

    /// Construct an `auth.rejected` event.
    #[must_use]
    pub fn rejected(error: &AuthError, issuer: Option<String>, path: &str) -> Self {
        Self {
            event: "auth.rejected",
            principal: None,
            issuer,
            groups: None,
            reason: Some(error.code()),
            path: path.to_string(),
        }
    }
}

/// Emit an audit event via `tracing::info!`.
pub fn emit(event: &AuditEvent) {
    match serde_json::to_string(event) {
        Ok(ref json) => tracing::info!(audit = %json, "auth audit"),
        Err(ref e) => tracing::warn!(error = %e, "Failed to serialize audit event"),
    }
}
