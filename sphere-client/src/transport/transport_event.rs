use bytes::Bytes;
use sphere_core::{IceCandidate, PeerId};

use crate::media::TrackKind;
use crate::transport::PeerConnectionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: TrackKind,
}

/// Events transports push into the engine loop.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Trickled local candidate; forwarded to the remote side over signaling.
    CandidateGenerated(PeerId, IceCandidate),

    NegotiationNeeded(PeerId),

    StateChanged(PeerId, PeerConnectionState),

    TrackArrived(PeerId, RemoteTrack),

    DataChannelOpen(PeerId),

    Message(PeerId, Bytes),

    /// Fired by the engine's own restart timer.
    IceRestartDue(PeerId),
}
