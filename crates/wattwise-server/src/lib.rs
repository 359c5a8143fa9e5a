//! HTTP front door for WattWise
//!
//! Routes, handlers and the JSON error envelope. `serve` runs the API until
//! Ctrl-C.

pub mod error;
pub mod handlers;
pub mod limits;
pub mod router;
pub mod state;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use wattwise_core::ServerConfig;

pub use error::{ApiError, ErrorEnvelope};
pub use router::router;
pub use state::AppState;

/// Bind to the configured address and serve until shutdown.
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
