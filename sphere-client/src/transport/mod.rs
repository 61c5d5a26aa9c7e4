mod peer_transport;
mod rtc_transport;
mod transport_event;

pub use peer_transport::{PeerConnectionState, PeerTransport, PeerTransportFactory, TrackChange};
pub use rtc_transport::{RtcPeerTransport, RtcTransportFactory};
pub use transport_event::{RemoteTrack, TransportEvent};
