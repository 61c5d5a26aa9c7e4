use crate::room::RoomCommand;
use crate::signaling::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use sphere_core::{ClientEvent, PeerId, ServerEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(peer_id): Path<String>,
    State(service): State<SignalingService>,
) -> Response {
    let peer_id = match peer_id.parse::<PeerId>() {
        Ok(id) => id,
        Err(e) => {
            warn!("Rejecting WebSocket with bad peer id {:?}: {}", peer_id, e);
            return (StatusCode::BAD_REQUEST, "Invalid peer id").into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, peer_id, service))
}

async fn handle_socket(socket: WebSocket, peer_id: PeerId, service: SignalingService) {
    info!("New WebSocket connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let generation = service.registry.register(peer_id.clone(), tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let peer_id = peer_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => {
                        match serde_json::from_str::<ClientEvent>(text.as_str()) {
                            Ok(event) => route_event(&service, &peer_id, event).await,
                            Err(e) => {
                                warn!("Invalid ClientEvent from {}: {}", peer_id, e);
                                service.registry.send_signal(
                                    &peer_id,
                                    &ServerEvent::Error {
                                        message: format!("Malformed message: {}", e),
                                    },
                                );
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    if let Some(entry) = service.registry.unregister(&peer_id, generation) {
        if let Some(room_id) = entry.room {
            service
                .rooms
                .dispatch(
                    &room_id,
                    RoomCommand::Disconnect {
                        peer_id: peer_id.clone(),
                    },
                )
                .await;
        }
    }
    info!("WebSocket disconnected: {}", peer_id);
}

async fn route_event(service: &SignalingService, peer_id: &PeerId, event: ClientEvent) {
    match event {
        ClientEvent::JoinRoom {
            room_id,
            mut user,
            privacy,
            token,
            media,
        } => {
            info!("Peer {} wants to join room '{}'", peer_id, room_id);
            if let Some(previous) = service.registry.set_room(peer_id, room_id.clone()) {
                if previous != room_id {
                    service
                        .rooms
                        .dispatch(
                            &previous,
                            RoomCommand::Disconnect {
                                peer_id: peer_id.clone(),
                            },
                        )
                        .await;
                }
            }

            // The socket path is the identity, whatever the payload claims.
            user.id = peer_id.clone();
            service
                .rooms
                .dispatch(
                    &room_id,
                    RoomCommand::Join {
                        user,
                        privacy,
                        token,
                        media,
                    },
                )
                .await;
        }

        ClientEvent::LeaveRoom => {
            let Some(room_id) = service.registry.take_room(peer_id) else {
                debug!("Peer {} left without being in a room", peer_id);
                return;
            };
            service
                .rooms
                .dispatch(
                    &room_id,
                    RoomCommand::Event {
                        peer_id: peer_id.clone(),
                        event: ClientEvent::LeaveRoom,
                    },
                )
                .await;
        }

        event => {
            let Some(room_id) = service.registry.room_of(peer_id) else {
                service.registry.send_signal(
                    peer_id,
                    &ServerEvent::Error {
                        message: "Join a room first".into(),
                    },
                );
                return;
            };
            service
                .rooms
                .dispatch(
                    &room_id,
                    RoomCommand::Event {
                        peer_id: peer_id.clone(),
                        event,
                    },
                )
                .await;
        }
    }
}
