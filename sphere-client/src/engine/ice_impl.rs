use sphere_core::{IceCandidate, PeerId};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::engine::{CallEngine, NoticeLevel};
use crate::negotiation::RenegotiationReason;
use crate::transport::{PeerConnectionState, TransportEvent};

impl CallEngine {
    /// Candidates are held until the remote description is applied.
    pub(super) async fn handle_ice_candidate(&mut self, from: PeerId, candidate: IceCandidate) {
        let Some(slot) = self.peers.get_mut(&from) else {
            debug!("Buffering early candidate from {}", from);
            self.early_candidates.entry(from).or_default().push(candidate);
            return;
        };

        if !slot.remote_applied {
            slot.pending_candidates.push(candidate);
            return;
        }

        let transport = Arc::clone(&slot.transport);
        let ignoring = slot.negotiator.is_ignoring_offer();
        if let Err(e) = transport.add_ice_candidate(candidate).await {
            if ignoring {
                debug!("Candidate for ignored offer from {} dropped: {}", from, e);
            } else {
                warn!("Failed to add candidate from {}: {}", from, e);
            }
        }
    }

    pub(super) async fn flush_candidates(&mut self, remote: &PeerId) {
        let Some(slot) = self.peers.get_mut(remote) else {
            return;
        };
        slot.remote_applied = true;
        let pending = std::mem::take(&mut slot.pending_candidates);
        let transport = Arc::clone(&slot.transport);

        if !pending.is_empty() {
            debug!("Applying {} buffered candidate(s) from {}", pending.len(), remote);
        }
        for candidate in pending {
            if let Err(e) = transport.add_ice_candidate(candidate).await {
                warn!("Failed to add buffered candidate from {}: {}", remote, e);
            }
        }
    }

    pub(super) fn schedule_ice_restart(&mut self, remote: &PeerId) {
        let max = self.config.max_ice_restarts;
        let delay = self.config.ice_restart_delay();
        let Some(slot) = self.peers.get_mut(remote) else {
            return;
        };
        if slot.restart_scheduled {
            return;
        }
        if let Some(max) = max {
            if slot.ice_restarts >= max {
                warn!("Giving up on {} after {} ICE restarts", remote, max);
                self.notify(
                    NoticeLevel::Warning,
                    format!("Connection to {} could not be restored", remote),
                );
                return;
            }
        }
        slot.restart_scheduled = true;

        let tx = self.transport_tx.clone();
        let remote = remote.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(TransportEvent::IceRestartDue(remote)).await;
        });
    }

    pub(super) async fn restart_ice(&mut self, remote: PeerId) {
        let Some(slot) = self.peers.get_mut(&remote) else {
            return;
        };
        slot.restart_scheduled = false;

        match slot.state {
            PeerConnectionState::Connected | PeerConnectionState::Closed => return,
            PeerConnectionState::Failed | PeerConnectionState::Disconnected => {
                let transport = Arc::clone(&slot.transport);
                if slot.negotiator.abandon_offer() {
                    debug!("Offer to {} went unanswered, rolling it back", remote);
                    if let Err(e) = transport.rollback().await {
                        warn!("Rollback for {} failed: {}", remote, e);
                    }
                }
                if self
                    .request_offer(&remote, RenegotiationReason::IceRestart)
                    .await
                {
                    if let Some(slot) = self.peers.get_mut(&remote) {
                        slot.ice_restarts += 1;
                        info!("ICE restart #{} for {}", slot.ice_restarts, remote);
                    }
                }
            }
            PeerConnectionState::New | PeerConnectionState::Connecting => {}
        }

        // keep checking until the connection recovers
        self.schedule_ice_restart(&remote);
    }
}
