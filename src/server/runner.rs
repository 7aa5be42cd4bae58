//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use super::{
    handler::{get_cards, get_room_history, health_check, websocket_handler},
    signal::shutdown_signal,
    state::{SessionState, SharedState},
};

/// Run the planning poker server
///
/// # Arguments
///
/// * `host` - The host address to bind to (e.g., "127.0.0.1")
/// * `port` - The port number to bind to (e.g., 8080)
pub async fn run_server(
    host: String,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state: SharedState = Arc::new(Mutex::new(SessionState::new()));

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/cards", get(get_cards))
        .route("/api/rooms/{room_id}/history", get(get_room_history))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!(
        "Planning poker server listening on {}",
        listener.local_addr()?
    );
    tracing::info!("Connect to: ws://{}/ws", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown gracefully");

    // Set up graceful shutdown signal handler
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
