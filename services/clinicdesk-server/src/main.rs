//! ClinicDesk API server
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings
//! clinicdesk-server
//!
//! # Start with custom config
//! clinicdesk-server --config /path/to/config.toml
//!
//! # Start with environment overrides
//! CLINICDESK__SERVER__PORT=8080 clinicdesk-server
//! ```
//!
//! On startup (unless disabled) a demo clinic is seeded and its id logged;
//! requests authenticate by presenting `x-user-id`, `x-clinic-id` and
//! `x-role` headers, which a fronting auth proxy would inject after
//! verifying the session.

mod config;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clinicdesk_api::{create_router, ApiConfig, AppState, HeaderAccessGuard};
use clinicdesk_store::Store;
use clinicdesk_types::Clinic;

use crate::config::ServerConfig;

/// ClinicDesk API server - clinic front-desk and billing core
#[derive(Parser, Debug)]
#[command(name = "clinicdesk-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "CLINICDESK_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "CLINICDESK_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "CLINICDESK_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CLINICDESK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "CLINICDESK_LOG_FORMAT")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        server_config.server.host = host;
    }
    if let Some(port) = args.port {
        server_config.server.port = port;
    }
    if let Some(level) = args.log_level {
        server_config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        server_config.logging.format = format;
    }

    init_logging(&server_config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting ClinicDesk server"
    );

    let store = Store::new();
    if server_config.seed.enabled {
        seed_demo_clinic(&store, &server_config.seed).await?;
    }

    let state = Arc::new(AppState::new(store, Arc::new(HeaderAccessGuard)));

    let api_config = ApiConfig {
        enable_cors: server_config.api.enable_cors,
        enable_tracing: server_config.api.enable_tracing,
    };
    let app = create_router(state, api_config);

    let addr = server_config.server.socket_addr()?;
    tracing::info!(
        host = %server_config.server.host,
        port = server_config.server.port,
        "Server listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(server_config.server.shutdown_timeout()))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber.with(fmt::layer().json().with_target(true)).init();
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .init();
        }
    }

    Ok(())
}

/// Seed the demo tenant and log the identity values needed to call the API
async fn seed_demo_clinic(store: &Store, seed: &config::SeedConfig) -> anyhow::Result<()> {
    let clinic = Clinic::new(
        seed.clinic_name.clone(),
        seed.clinic_address.clone(),
        seed.clinic_phone.clone(),
    );
    let clinic_id = clinic.id;
    store
        .clinic_repo()
        .create(clinic)
        .await
        .map_err(|e| anyhow::anyhow!("failed to seed demo clinic: {e}"))?;

    tracing::info!(
        clinic_id = %clinic_id,
        name = %seed.clinic_name,
        "Demo clinic seeded; pass this id in x-clinic-id with any x-user-id and x-role"
    );
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    tracing::info!(
        timeout_secs = timeout.as_secs(),
        "Waiting for in-flight requests to complete..."
    );
    tokio::time::sleep(timeout).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["clinicdesk-server", "--port", "8080"]);
        assert_eq!(args.port, Some(8080));
    }
}
