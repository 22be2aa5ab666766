//! Error types for ROR Auth

use std::io;

use thiserror::Error;

/// Result type alias for ROR Auth
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level errors (startup, configuration, serving).
///
/// Per-request authentication failures are [`crate::auth::AuthError`] and
/// never surface here.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No usable OIDC provider after startup registration
    #[error("No usable OIDC provider ({configured} configured, {failed} failed)")]
    NoProviders {
        /// Providers found in configuration
        configured: usize,
        /// Providers that failed construction or validation
        failed: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
