// crates/server/src/main.rs
//! Pageshot server binary.
//!
//! Wires a Chromium capture engine into the job manager, starts the worker
//! pool, then serves the HTTP API until Ctrl-C. The pool is stopped on the
//! way out so in-flight browser processes get torn down.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pageshot_core::{CaptureEngine, ChromiumEngine, ManagerConfig};
use pageshot_server::{create_app, AppState};

/// Default port for the server.
const DEFAULT_PORT: u16 = 8000;

/// Get the server port from environment or use default.
fn get_port() -> u16 {
    std::env::var("PAGESHOT_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Resolve when the process receives Ctrl-C.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
        Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (RUST_LOG overrides the default level)
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Print banner
    eprintln!("\n\u{1f4f8} pageshot v{}\n", env!("CARGO_PKG_VERSION"));

    // Step 1: Build the capture engine and probe the browser binary
    let engine = Arc::new(ChromiumEngine::from_env());
    if let Err(e) = engine.health_check().await {
        tracing::warn!(
            "Browser health check failed ({}); captures will fail until {} is available",
            e,
            engine.name()
        );
    }

    // Step 2: Create shared state and start the worker pool
    let config = ManagerConfig::from_env();
    let workers = config.workers;
    let state = AppState::new(engine, config);
    state.manager.start().await;

    // Step 3: Build the Axum app
    let app = create_app(state.clone());

    // Step 4: Bind and serve until Ctrl-C
    let port = get_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    eprintln!("  \u{2713} Ready \u{2014} {} capture workers", workers);
    eprintln!("  \u{2192} http://localhost:{}\n", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Step 5: Tear down the pool so in-flight browsers are killed
    state.manager.stop().await;

    Ok(())
}
