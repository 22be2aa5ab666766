//! Authentication middleware
//!
//! Rejects unauthenticated requests with `401` before any handler runs and
//! publishes the [`Identity`](ror_identity::Identity) into request extensions on success.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, warn};

use super::audit::{self, AuditEvent};
use super::{AuthError, Authenticator};

/// Shared state for [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthState {
    /// Token to identity pipeline
    pub authenticator: Arc<Authenticator>,
    /// Path prefixes that bypass authentication
    pub public_paths: Arc<[String]>,
}

impl AuthState {
    /// Create middleware state.
    #[must_use]
    pub fn new(authenticator: Arc<Authenticator>, public_paths: Vec<String>) -> Self {
        Self {
            authenticator,
            public_paths: public_paths.into(),
        }
    }

    /// Check if a path is public (bypasses auth)
    #[must_use]
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| path.starts_with(p.as_str()))
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if state.is_public_path(&path) {
        debug!(path = %path, "Public path, skipping auth");
        return next.run(request).await;
    }

    // A non-UTF-8 header value cannot carry a Bearer credential
    let token = match request.headers().get(header::AUTHORIZATION) {
        None => Authenticator::extract_bearer(None),
        Some(value) => value
            .to_str()
            .map_err(|_| AuthError::NotBearerScheme)
            .and_then(|v| Authenticator::extract_bearer(Some(v))),
    }
    .map(str::to_owned);

    let (result, issuer) = match token {
        Ok(token) => state.authenticator.authenticate_with_issuer(&token).await,
        Err(e) => (Err(e), None),
    };

    match result {
        Ok(identity) => {
            debug!(principal = %identity.principal_id(), path = %path, "Authenticated request");
            audit::emit(&AuditEvent::authenticated(&identity, issuer, &path));
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            warn!(reason = e.code(), error = %e, path = %path, "Rejected request");
            audit::emit(&AuditEvent::rejected(&e, issuer, &path));
            unauthorized_response(&e)
        }
    }
}

/// Create a 401 Unauthorized response
fn unauthorized_response(error: &AuthError) -> Response {
    let status = error.status();
    (
        status,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        Json(json!({
            "status": status.as_u16(),
            "error": error.code(),
            "message": error.public_message(),
        })),
    )
        .into_response()
}
