use sphere_core::{ClientEvent, PeerId};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::engine::CallEngine;
use crate::media::LocalStream;
use crate::negotiation::{OfferDecision, RenegotiationReason};

impl CallEngine {
    /// Returns true when an offer went out right away.
    pub(super) async fn request_offer(
        &mut self,
        remote: &PeerId,
        reason: RenegotiationReason,
    ) -> bool {
        let Some(slot) = self.peers.get_mut(remote) else {
            return false;
        };
        match slot.negotiator.request_offer(reason) {
            OfferDecision::SendNow { ice_restart } => self.send_offer(remote, ice_restart).await,
            OfferDecision::Queued => {
                debug!("Offer to {} queued ({:?})", remote, reason);
                false
            }
        }
    }

    pub(super) async fn follow_up(&mut self, remote: &PeerId, next: Option<OfferDecision>) {
        if let Some(OfferDecision::SendNow { ice_restart }) = next {
            self.send_offer(remote, ice_restart).await;
        }
    }

    async fn send_offer(&mut self, remote: &PeerId, ice_restart: bool) -> bool {
        let Some(transport) = self.peers.get(remote).map(|s| Arc::clone(&s.transport)) else {
            return false;
        };

        let description = match transport.create_offer(ice_restart).await {
            Ok(d) => d,
            Err(e) => {
                warn!("Failed to create offer for {}: {}", remote, e);
                self.offer_failed(remote);
                return false;
            }
        };

        let event = ClientEvent::Signal {
            to: remote.clone(),
            description,
        };
        if let Err(e) = self.signaling.emit(event).await {
            warn!("Failed to send offer to {}: {}", remote, e);
            self.offer_failed(remote);
            return false;
        }
        debug!("Offer sent to {} (ice restart: {})", remote, ice_restart);
        true
    }

    fn offer_failed(&mut self, remote: &PeerId) {
        if let Some(slot) = self.peers.get_mut(remote) {
            slot.negotiator.offer_failed();
        }
    }

    /// Publishes `stream` as the local stream and pushes it to every peer.
    pub(super) async fn update_peer_connection_tracks(&mut self, stream: LocalStream) {
        self.local_stream = Some(stream.clone());
        self.stream_tx.send_replace(Some(stream.clone()));

        let ids: Vec<PeerId> = self.peers.keys().cloned().collect();
        for id in ids {
            let Some(transport) = self.peers.get(&id).map(|s| Arc::clone(&s.transport)) else {
                continue;
            };
            match transport.sync_tracks(Some(&stream)).await {
                Ok(change) if !change.is_empty() => {
                    debug!("Tracks for {} changed: {:?}", id, change);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Failed to update tracks for {}: {}", id, e);
                    continue;
                }
            }
            self.request_offer(&id, RenegotiationReason::TracksChanged)
                .await;
        }
    }
}
