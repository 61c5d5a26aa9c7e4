mod test_health;

use std::net::SocketAddr;

use sphere_server::{ServerConfig, SignalingService, router};

/// Serves the relay on an ephemeral local port.
pub async fn start_server(config: ServerConfig) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    let app = router(SignalingService::new(&config));

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}
