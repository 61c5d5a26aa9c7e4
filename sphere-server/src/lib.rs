pub mod config;
pub mod room;
pub mod signaling;

pub use config::ServerConfig;
pub use room::*;
pub use signaling::*;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub fn router(service: SignalingService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws/{peer_id}", get(ws_handler))
        .route("/health", get(health))
        .layer(cors)
        .with_state(service)
}

async fn health(State(service): State<SignalingService>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "rooms": service.rooms.room_count(),
        "peers": service.registry.peer_count(),
    }))
}

/// Binds `config.bind` and serves until the process is stopped.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let service = SignalingService::new(&config);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(service)).await?;
    Ok(())
}
