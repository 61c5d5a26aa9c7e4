use crate::config::ServerConfig;
use crate::room::RoomManager;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use sphere_core::{PeerId, RoomId, ServerEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Подключение одного пользователя.
pub struct PeerEntry {
    /// Номер подключения. Переподключение с тем же id получает новый номер,
    /// поэтому закрытие старого сокета не удаляет новое подключение.
    pub generation: u64,
    pub tx: mpsc::UnboundedSender<Message>,
    /// Комната, в которую пользователь вошёл через этот сокет.
    pub room: Option<RoomId>,
}

struct RegistryInner {
    peers: DashMap<PeerId, PeerEntry>,
    next_generation: AtomicU64,
}

/// Live WebSocket connections keyed by peer id.
#[derive(Clone)]
pub struct PeerRegistry {
    inner: Arc<RegistryInner>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                peers: DashMap::new(),
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    /// Registers a connection and returns its generation. A replaced
    /// connection keeps its room so the rejoin is routed to it.
    pub fn register(&self, peer_id: PeerId, tx: mpsc::UnboundedSender<Message>) -> u64 {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let room = self
            .inner
            .peers
            .get(&peer_id)
            .and_then(|old| old.room.clone());

        if room.is_some() {
            debug!("Peer {} reconnected, replacing old socket", peer_id);
        }
        self.inner.peers.insert(
            peer_id,
            PeerEntry {
                generation,
                tx,
                room,
            },
        );
        generation
    }

    /// Removes the connection only if it is still the one identified by
    /// `generation`.
    pub fn unregister(&self, peer_id: &PeerId, generation: u64) -> Option<PeerEntry> {
        self.inner
            .peers
            .remove_if(peer_id, |_, entry| entry.generation == generation)
            .map(|(_, entry)| entry)
    }

    pub fn room_of(&self, peer_id: &PeerId) -> Option<RoomId> {
        self.inner.peers.get(peer_id).and_then(|e| e.room.clone())
    }

    /// Returns the previous room, if any.
    pub fn set_room(&self, peer_id: &PeerId, room: RoomId) -> Option<RoomId> {
        self.inner
            .peers
            .get_mut(peer_id)
            .and_then(|mut e| e.room.replace(room))
    }

    pub fn take_room(&self, peer_id: &PeerId) -> Option<RoomId> {
        self.inner
            .peers
            .get_mut(peer_id)
            .and_then(|mut e| e.room.take())
    }

    pub fn peer_count(&self) -> usize {
        self.inner.peers.len()
    }

    pub fn send_signal(&self, peer_id: &PeerId, event: &ServerEvent) {
        let Some(peer) = self.inner.peers.get(peer_id) else {
            warn!("Attempted to send signal to disconnected user {}", peer_id);
            return;
        };

        match serde_json::to_string(event) {
            Ok(json) => {
                if let Err(e) = peer.tx.send(Message::Text(json.into())) {
                    error!("Failed to send WS message to {}: {:?}", peer_id, e);
                }
            }
            Err(e) => error!("Failed to serialize server event: {}", e),
        }
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalingOutput for PeerRegistry {
    async fn send(&self, peer_id: &PeerId, event: ServerEvent) {
        self.send_signal(peer_id, &event);
    }
}

/// Shared state of the axum application.
#[derive(Clone)]
pub struct SignalingService {
    pub registry: PeerRegistry,
    pub rooms: RoomManager,
}

impl SignalingService {
    pub fn new(config: &ServerConfig) -> Self {
        let registry = PeerRegistry::new();
        let rooms = RoomManager::new(
            config.room_settings(),
            config.command_buffer,
            Arc::new(registry.clone()),
        );
        Self { registry, rooms }
    }
}
