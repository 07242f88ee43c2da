// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! StoryCraft API Server

use std::sync::Arc;
use storycraft::{config::Config, db::Database, services::UploadStore, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting StoryCraft API");

    let db = Database::connect(&config).await?;
    tracing::info!(memory = config.uses_memory_store(), "Database ready");

    let uploads = UploadStore::new(config.public_dir.clone(), config.max_upload_bytes);
    tokio::fs::create_dir_all(uploads.uploads_dir()).await?;
    tracing::info!(path = %uploads.uploads_dir().display(), "Serving uploads");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        uploads,
    });

    // Build router
    let app = storycraft::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("storycraft=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
