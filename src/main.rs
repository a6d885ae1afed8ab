// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calorimetrics API Server
//!
//! Serves the live tracking session and passcode login to the dashboard
//! frontend.

use anyhow::Context;
use calorimetrics::{
    config::Config,
    store::{FileStore, KeyValueStore, MemoryStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting Calorimetrics API");

    // Open the key/value store
    let store: Arc<dyn KeyValueStore> = match &config.data_file {
        Some(path) => Arc::new(FileStore::open(path).context("Failed to open data file")?),
        None => {
            tracing::warn!("DATA_FILE not set, state will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    // Build shared state and pick up where the last run left off
    let state = Arc::new(AppState::new(config.clone(), store));
    state.restore();

    // Build router
    let app = calorimetrics::routes::create_router(state.clone());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop ticking; the persisted session is restored on next start
    state.tracker.shutdown();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("calorimetrics=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
