//! ROR Auth - multi-issuer OIDC authentication for the ROR control plane

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use ror_auth::{
    cli::{Cli, Command},
    config::Config,
    oidc::{http_client, load_providers},
    server::AuthServer,
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(Command::Providers) => run_providers(config).await,
        Some(Command::Serve) | None => run_server(config).await,
    }
}

/// Load the config file and apply CLI / `OIDC_*` overrides
fn load_config(cli: &Cli) -> ror_auth::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref host) = cli.host {
        config.server.host.clone_from(host);
    }
    config
        .auth
        .apply_default_provider_overrides(&cli.default_provider_overrides());
    Ok(config)
}

/// Build the registry, print it and exit
async fn run_providers(config: Config) -> ExitCode {
    let registry = match http_client(config.auth.discovery_timeout()) {
        Ok(http) => load_providers(&http, &config.auth).await,
        Err(e) => Err(e),
    };

    match registry {
        Ok(registry) => {
            println!("{} OIDC provider(s):\n", registry.len());
            for issuer in registry.issuers() {
                if let Some(provider) = registry.get_provider_by_url(&issuer) {
                    println!("{issuer}");
                    println!("   Audiences: {}", provider.audiences().join(", "));
                    println!("   Trust mode: {}", provider.trust_mode());
                    println!();
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("No usable OIDC provider: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run the authentication server
async fn run_server(config: Config) -> ExitCode {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        providers = config.auth.providers.len(),
        default_provider = config.auth.default_provider.issuer.is_some(),
        "Starting ROR auth"
    );

    let server = match AuthServer::new(config).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create server: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Run with graceful shutdown
    if let Err(e) = server.run().await {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}
