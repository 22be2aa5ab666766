//! Authentication server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::State,
    middleware,
    routing::get,
};
use ror_identity::Identity;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::auth::{AuthState, Authenticator, auth_middleware};
use crate::config::Config;
use crate::oidc::{ProviderRegistry, http_client, load_providers};
use crate::{Error, Result};

/// HTTP host for the authentication pipeline
pub struct AuthServer {
    /// Configuration
    config: Config,
    /// Registered OIDC providers
    registry: Arc<ProviderRegistry>,
}

impl AuthServer {
    /// Discover every configured provider and build the server.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built or no provider is usable.
    pub async fn new(config: Config) -> Result<Self> {
        let http = http_client(config.auth.discovery_timeout())?;
        let registry = load_providers(&http, &config.auth).await?;
        Ok(Self::with_registry(config, Arc::new(registry)))
    }

    /// Build the server around an already populated registry.
    #[must_use]
    pub fn with_registry(config: Config, registry: Arc<ProviderRegistry>) -> Self {
        Self { config, registry }
    }

    /// The provider registry; providers added here are visible to new requests.
    #[must_use]
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Build the router: `/health` (public) and `/v1/whoami` behind auth.
    #[must_use]
    pub fn router(&self) -> Router {
        let authenticator = Authenticator::new(Arc::clone(&self.registry))
            .with_verification_timeout(self.config.auth.verification_timeout());
        let auth_state = AuthState::new(
            Arc::new(authenticator),
            self.config.auth.public_paths.clone(),
        );

        Router::new()
            .route("/health", get(health_handler))
            .route("/v1/whoami", get(whoami_handler))
            .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
            .layer(CatchPanicLayer::new())
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::clone(&self.registry))
    }

    /// Run the server until SIGINT/SIGTERM
    ///
    /// # Errors
    ///
    /// Fails if the address is invalid or the listener cannot bind.
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        );

        let app = self.router();
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, providers = self.registry.len(), "ROR auth listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        Ok(())
    }
}

/// GET /health
async fn health_handler(State(registry): State<Arc<ProviderRegistry>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "providers": registry.len(),
    }))
}

/// GET /v1/whoami - the identity published by the auth middleware
async fn whoami_handler(Extension(identity): Extension<Identity>) -> Json<Identity> {
    Json(identity)
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
