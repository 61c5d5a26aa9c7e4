use sphere_server::ServerConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::start_server;
use crate::integration::init_tracing;

#[tokio::test]
async fn test_health() {
    init_tracing();

    let addr = start_server(ServerConfig::default()).await;

    let mut stream = TcpStream::connect(addr).await.expect("Failed to connect");
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    let body = response.split("\r\n\r\n").nth(1).unwrap_or_default();
    let json: serde_json::Value = serde_json::from_str(body).expect("Body is not JSON");
    assert_eq!(json["status"], "ok");
    assert_eq!(json["rooms"], 0);
}

#[tokio::test]
async fn test_bad_peer_id_is_rejected() {
    init_tracing();

    let addr = start_server(ServerConfig::default()).await;

    let mut stream = TcpStream::connect(addr).await.expect("Failed to connect");
    stream
        .write_all(
            b"GET /ws/not-a-peer HTTP/1.1\r\nHost: localhost\r\nConnection: Upgrade\r\n\
              Upgrade: websocket\r\nSec-WebSocket-Version: 13\r\n\
              Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n",
        )
        .await
        .unwrap();

    let mut buf = [0u8; 64];
    let n = stream.read(&mut buf).await.unwrap();
    let head = String::from_utf8_lossy(&buf[..n]);
    assert!(head.starts_with("HTTP/1.1 400"), "{}", head);
}
