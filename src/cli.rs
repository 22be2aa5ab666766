//! Command-line interface

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};

use crate::oidc::DefaultProviderSettings;

/// ROR control-plane authentication service - multi-issuer OIDC
#[derive(Parser, Debug)]
#[command(name = "ror-auth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "ROR_AUTH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "ROR_AUTH_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "ROR_AUTH_HOST")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "ROR_AUTH_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "ROR_AUTH_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Issuer URL of the default OIDC provider
    #[arg(long, env = "OIDC_PROVIDER", global = true)]
    pub oidc_provider: Option<String>,

    /// Web client ID accepted for the default provider
    #[arg(long, env = "OIDC_CLIENT_ID", global = true)]
    pub oidc_client_id: Option<String>,

    /// Device-flow client ID accepted for the default provider
    #[arg(long, env = "OIDC_DEVICE_CLIENT_ID", global = true)]
    pub oidc_device_client_id: Option<String>,

    /// Tolerate a discovery issuer mismatch for the default provider (development only)
    ///
    /// Accepts `1`/`0`, `yes`/`no`, `on`/`off` and `true`/`false`.
    #[arg(
        long,
        env = "OIDC_SKIP_ISSUER_VERIFY",
        global = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub oidc_skip_issuer_verify: bool,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the authentication server (default)
    Serve,

    /// Build the provider registry, print it and exit
    Providers,
}

impl Cli {
    /// Default-provider values given on the command line or in `OIDC_*`.
    #[must_use]
    pub fn default_provider_overrides(&self) -> DefaultProviderSettings {
        DefaultProviderSettings {
            issuer: self.oidc_provider.clone(),
            client_id: self.oidc_client_id.clone(),
            device_client_id: self.oidc_device_client_id.clone(),
            skip_issuer_verify: self.oidc_skip_issuer_verify,
        }
    }
}
