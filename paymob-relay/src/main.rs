//! Paymob Relay - HTTP server.
//!
//! This binary serves three endpoints:
//! - Card checkout creation for the merchant app
//! - Redirection callback verification (GET query string)
//! - Processed webhook verification (POST JSON body)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use paymob_relay::web::{router, AppState};
use paymob_relay::{Config, LogFulfillment};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("relay_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        hmac_configured = config.hmac_secret.is_some(),
        api_key_configured = config.api_key.is_some(),
        card_integration_id = ?config.card_integration_id,
        iframe_id = ?config.iframe_id,
        paymob_base_url = %config.paymob_base_url,
        "config_loaded"
    );

    if config.hmac_secret.is_none() {
        warn!("PAYMOB_HMAC not set - callbacks will be answered with 500");
    }
    if let Err(e) = config.checkout() {
        warn!(error = %e, "checkout_not_configured");
    }

    let port = config.port;
    let state = AppState::new(config, Arc::new(LogFulfillment))
        .context("Failed to create Paymob client")?;

    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "relay_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("relay_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
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
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("relay_shutting_down");
}
