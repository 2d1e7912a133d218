//! FIR Assist console daemon
//!
//! Serves the control plane over HTTP:
//! - Service status (cached, refresh on demand)
//! - Stack deploy/stop
//! - Narrative analysis proxied to the backend

use anyhow::{Context, Result};
use console_lib::{ControlPlane, Settings};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod config;

use config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let server = ServerConfig::load()?;
    let settings = Settings::load(server.config.as_deref())?;

    info!(
        port = server.port,
        require_backend = server.require_backend,
        backend_url = %settings.backend_url,
        deployment_dir = %settings.deployment_dir.display(),
        "Console configuration loaded"
    );

    let plane = ControlPlane::from_settings(settings).context("Failed to build control plane")?;
    let logger = plane.logger.clone();
    logger.log_startup(env!("CARGO_PKG_VERSION"), "daemon");

    // Populate the cache once so the first reader sees real status
    plane.cache.refresh().await;

    let state = Arc::new(api::AppState::new(plane, server.require_backend));
    let result = api::serve(server.port, state, shutdown_signal()).await;

    logger.log_shutdown(match &result {
        Ok(()) => "signal",
        Err(_) => "server_error",
    });
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
