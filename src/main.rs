use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use watchparty::api::create_app;
use watchparty::config::{load_config, RelayConfig};
use watchparty::room::RoomRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "watchparty=info".into()),
        )
        .init();

    info!("Watchparty relay starting...");

    let config = match std::env::var("WATCHPARTY_CONFIG") {
        Ok(path) => load_config(&path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e))?,
        Err(_) => RelayConfig::default(),
    }
    .with_env_overrides();

    let addr = config
        .server
        .bind_addr()
        .context("Invalid listen address")?;

    info!(
        addr = %addr,
        ws_path = %config.server.ws_path,
        chat_max_chars = config.session.chat_max_chars,
        idle_timeout_seconds = config.session.idle_timeout_seconds,
        "Configuration loaded"
    );

    let registry = Arc::new(RoomRegistry::new());
    let app = create_app(&config, Arc::clone(&registry));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listen address")?;
    info!(addr = %addr, "HTTP listening");
    info!(path = %config.server.ws_path, "WS listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!(rooms = registry.room_count(), "Watchparty relay stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl_c signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
