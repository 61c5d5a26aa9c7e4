use bytes::Bytes;
use sphere_core::{ClientEvent, Packet, PeerId};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::engine::{CallEngine, CallEvent};
use crate::negotiation::RenegotiationReason;
use crate::transport::{PeerConnectionState, TransportEvent};

impl CallEngine {
    pub(super) async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::CandidateGenerated(peer, candidate) => {
                if !self.peers.contains_key(&peer) {
                    return;
                }
                let event = ClientEvent::IceCandidate {
                    to: peer.clone(),
                    candidate,
                };
                if let Err(e) = self.signaling.emit(event).await {
                    warn!("Failed to send candidate to {}: {}", peer, e);
                }
            }

            TransportEvent::NegotiationNeeded(peer) => {
                self.request_offer(&peer, RenegotiationReason::NegotiationNeeded)
                    .await;
            }

            TransportEvent::StateChanged(peer, state) => {
                self.on_connection_state(peer, state);
            }

            TransportEvent::TrackArrived(peer, track) => {
                info!("Remote {:?} track from {}", track.kind, peer);
                self.emit_event(CallEvent::RemoteTrack { peer, track });
            }

            TransportEvent::DataChannelOpen(peer) => {
                debug!("Data channel to {} open", peer);
            }

            TransportEvent::Message(peer, data) => self.handle_packet(peer, data),

            TransportEvent::IceRestartDue(peer) => self.restart_ice(peer).await,
        }
    }

    fn on_connection_state(&mut self, peer: PeerId, state: PeerConnectionState) {
        let Some(slot) = self.peers.get_mut(&peer) else {
            return;
        };
        if slot.state == state {
            return;
        }
        slot.state = state;
        info!("Connection to {} is {:?}", peer, state);

        match state {
            PeerConnectionState::Connected => slot.ice_restarts = 0,
            PeerConnectionState::Failed => self.schedule_ice_restart(&peer),
            _ => {}
        }
        self.emit_event(CallEvent::ConnectionState { peer, state });
    }

    fn handle_packet(&mut self, peer: PeerId, data: Bytes) {
        match postcard::from_bytes::<Packet>(&data) {
            Ok(Packet::Chat(message)) => self.accept_chat(message),
            Ok(Packet::MediaState(media)) => self.apply_remote_media(&peer, media),
            Err(e) => warn!("Malformed packet from {}: {}", peer, e),
        }
    }

    /// Sends `packet` on every open data channel. Returns how many peers got it.
    pub(super) async fn broadcast_packet(&self, packet: &Packet) -> usize {
        let data = match postcard::to_allocvec(packet) {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                warn!("Failed to encode packet: {}", e);
                return 0;
            }
        };

        let transports: Vec<_> = self
            .peers
            .iter()
            .map(|(id, slot)| (id.clone(), Arc::clone(&slot.transport)))
            .collect();

        let mut delivered = 0;
        for (id, transport) in transports {
            match transport.send_data(data.clone()).await {
                Ok(()) => delivered += 1,
                Err(e) => debug!("Data channel to {} unavailable: {}", id, e),
            }
        }
        delivered
    }
}
