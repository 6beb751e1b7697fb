//! damas-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use damas_gateway::api;
use damas_gateway::app_state::AppState;
use damas_gateway::config::{AppConfig, LogFormat};
use damas_gateway::payments::PixupClient;
use damas_gateway::persistence::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting damas-gateway");

    if !config.pixup_configured() {
        tracing::warn!(
            "PixUp credentials not configured; set PIXUP_CLIENT_ID and PIXUP_CLIENT_SECRET to enable deposits"
        );
    }

    // Open the store
    let db = Database::connect(
        &config.database_url,
        config.database_max_connections,
        Duration::from_secs(config.database_connect_timeout_secs),
    )
    .await
    .context("opening database")?;
    db.migrate().await.context("running migrations")?;

    // Build application state
    let payments = Arc::new(
        PixupClient::new(
            config.pixup_api_url.clone(),
            config.pixup_client_id.clone(),
            config.pixup_client_secret.clone(),
            Duration::from_secs(config.pixup_timeout_secs.max(1)),
        )
        .context("building PixUp client")?,
    );
    let app_state = AppState::new(&config, db.clone(), payments);

    let purged = app_state.auth.purge_expired().await?;
    if purged > 0 {
        tracing::info!(purged, "expired sessions removed");
    }

    // Build router
    let app = api::build_app(app_state, &config);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, public_url = %config.public_url, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
