//! Catalog Scout gateway
//!
//! Serves the orchestrator over a small JSON API.

use anyhow::Result;
use catalog_scout::{
    config,
    network::HttpClient,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Starting catalog-scout v{}", catalog_scout::VERSION);

    // Load configuration
    let settings = config::load()?;
    info!(
        "Backend {} with fallback {}",
        settings.backend.base_url, settings.metadata.base_url
    );
    if settings.metadata.api_key.is_none() {
        info!("No metadata API key configured; fallback and enrichment requests may be rejected");
    }

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;
    info!("HTTP client initialized");

    // Create application state
    let state = AppState::new(settings.clone(), client)?;
    info!("Application state initialized");

    // Create router
    let app = create_router(state);

    // Bind address
    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        settings.server.port,
    );

    info!("Starting server on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
