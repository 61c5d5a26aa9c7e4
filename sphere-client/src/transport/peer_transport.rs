use async_trait::async_trait;
use bytes::Bytes;
use sphere_core::{IceCandidate, IceServerConfig, PeerId, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::media::LocalStream;
use crate::transport::TransportEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Outcome of reconciling senders with a local stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackChange {
    pub added: usize,
    pub replaced: usize,
    pub removed: usize,
}

impl TrackChange {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.replaced == 0 && self.removed == 0
    }
}

/// One WebRTC connection to one remote participant.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    fn remote_id(&self) -> &PeerId;

    /// Creates an offer and applies it as the local description.
    async fn create_offer(&self, ice_restart: bool) -> Result<SessionDescription, TransportError>;

    /// Creates an answer and applies it as the local description.
    async fn create_answer(&self) -> Result<SessionDescription, TransportError>;

    async fn set_remote_description(&self, desc: SessionDescription)
    -> Result<(), TransportError>;

    /// Drops the outstanding local offer.
    async fn rollback(&self) -> Result<(), TransportError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError>;

    /// Makes the outgoing senders match `stream`, one sender per track kind.
    async fn sync_tracks(&self, stream: Option<&LocalStream>)
    -> Result<TrackChange, TransportError>;

    async fn open_data_channel(&self, label: &str) -> Result<(), TransportError>;

    async fn send_data(&self, data: Bytes) -> Result<(), TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}

#[async_trait]
pub trait PeerTransportFactory: Send + Sync {
    async fn create(
        &self,
        remote: PeerId,
        ice_servers: &[IceServerConfig],
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, TransportError>;
}
