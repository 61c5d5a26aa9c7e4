use sphere_core::PeerId;
use tracing::{debug, info, warn};

use crate::engine::{CHAT_CHANNEL, CallEngine, PeerSlot};
use crate::error::ClientError;
use crate::negotiation::{Negotiator, RenegotiationReason};
use crate::transport::PeerConnectionState;

impl CallEngine {
    /// At most one connection per remote id; a second call is a no-op.
    pub(super) async fn create_peer_connection(
        &mut self,
        remote: PeerId,
        initiator: bool,
    ) -> Result<(), ClientError> {
        if remote == *self.local_id() || self.peers.contains_key(&remote) {
            debug!("Peer connection to {} already exists", remote);
            return Ok(());
        }

        info!(
            "Creating peer connection to {} (initiator: {})",
            remote, initiator
        );

        let transport = self
            .factory
            .create(
                remote.clone(),
                &self.config.ice_servers,
                self.transport_tx.clone(),
            )
            .await?;

        if let Some(stream) = &self.local_stream {
            if let Err(e) = transport.sync_tracks(Some(stream)).await {
                warn!("Failed to attach local tracks for {}: {}", remote, e);
            }
        }

        if initiator {
            if let Err(e) = transport.open_data_channel(CHAT_CHANNEL).await {
                warn!("Failed to open data channel to {}: {}", remote, e);
            }
        }

        let slot = PeerSlot {
            transport,
            negotiator: Negotiator::new(self.local_id(), &remote),
            state: PeerConnectionState::New,
            remote_applied: false,
            pending_candidates: self.early_candidates.remove(&remote).unwrap_or_default(),
            ice_restarts: 0,
            restart_scheduled: false,
        };
        self.peers.insert(remote.clone(), slot);

        if initiator {
            self.request_offer(&remote, RenegotiationReason::Initial)
                .await;
        }
        Ok(())
    }

    pub(super) async fn close_peer_connection(&mut self, remote: &PeerId) {
        self.early_candidates.remove(remote);
        self.deferred_signals.retain(|(from, _)| from != remote);

        let Some(slot) = self.peers.shift_remove(remote) else {
            return;
        };
        if let Err(e) = slot.transport.close().await {
            warn!("Error closing peer connection to {}: {}", remote, e);
        }
        info!("Closed peer connection to {}", remote);
    }
}
