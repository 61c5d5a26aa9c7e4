use sphere_core::{ClientEvent, PeerId, SdpKind, SessionDescription};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::engine::CallEngine;
use crate::negotiation::RemoteDecision;

impl CallEngine {
    pub(super) async fn handle_remote_description(
        &mut self,
        from: PeerId,
        description: SessionDescription,
    ) {
        if !self.media_ready {
            debug!(
                "Local media not ready, deferring {:?} from {}",
                description.kind, from
            );
            self.deferred_signals.push((from, description));
            return;
        }

        if !self.peers.contains_key(&from) {
            if description.kind == SdpKind::Answer {
                warn!("Answer from {} without a peer connection", from);
                return;
            }
            if let Err(e) = self.create_peer_connection(from.clone(), false).await {
                warn!("Failed to create peer connection to {}: {}", from, e);
                return;
            }
        }

        let Some(slot) = self.peers.get_mut(&from) else {
            return;
        };
        let decision = slot.negotiator.on_remote_description(description.kind);
        let transport = Arc::clone(&slot.transport);

        let rollback = match decision {
            RemoteDecision::IgnoreCollision => {
                info!("Offer collision with {}: keeping our offer", from);
                return;
            }
            RemoteDecision::IgnoreStaleAnswer => {
                debug!("Dropping answer from {} outside of an offer", from);
                return;
            }
            RemoteDecision::Apply { rollback } => rollback,
        };

        if rollback {
            info!("Offer collision with {}: rolling back our offer", from);
            if let Err(e) = transport.rollback().await {
                warn!("Rollback for {} failed: {}", from, e);
            }
        }

        let kind = description.kind;
        if let Err(e) = transport.set_remote_description(description).await {
            warn!("Failed to apply remote {:?} from {}: {}", kind, from, e);
            let next = self
                .peers
                .get_mut(&from)
                .and_then(|slot| slot.negotiator.remote_failed());
            self.follow_up(&from, next).await;
            return;
        }

        self.flush_candidates(&from).await;

        let next = match kind {
            SdpKind::Offer => {
                match transport.create_answer().await {
                    Ok(answer) => {
                        let event = ClientEvent::Signal {
                            to: from.clone(),
                            description: answer,
                        };
                        if let Err(e) = self.signaling.emit(event).await {
                            warn!("Failed to send answer to {}: {}", from, e);
                        }
                    }
                    Err(e) => warn!("Failed to create answer for {}: {}", from, e),
                }
                self.peers
                    .get_mut(&from)
                    .and_then(|slot| slot.negotiator.answer_sent())
            }
            SdpKind::Answer => self
                .peers
                .get_mut(&from)
                .and_then(|slot| slot.negotiator.answer_applied()),
        };
        self.follow_up(&from, next).await;
    }

    /// Replays descriptions that arrived before local media was ready.
    pub(super) async fn replay_deferred_signals(&mut self) {
        let deferred = std::mem::take(&mut self.deferred_signals);
        if !deferred.is_empty() {
            info!("Replaying {} deferred description(s)", deferred.len());
        }
        for (from, description) in deferred {
            self.handle_remote_description(from, description).await;
        }
    }
}
