use async_trait::async_trait;
use bytes::Bytes;
use sphere_core::{IceCandidate, IceServerConfig, PeerId, SdpKind, SessionDescription};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::offer_answer_options::RTCOfferOptions;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

use crate::error::TransportError;
use crate::media::{LocalStream, MediaTrack, TrackKind};
use crate::transport::{
    PeerConnectionState, PeerTransport, PeerTransportFactory, RemoteTrack, TrackChange,
    TransportEvent,
};

const LOCAL_STREAM_ID: &str = "sphere-local";

#[derive(Default)]
pub struct RtcTransportFactory;

impl RtcTransportFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PeerTransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        remote: PeerId,
        ice_servers: &[IceServerConfig],
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>, TransportError> {
        let transport = RtcPeerTransport::new(remote, ice_servers, events).await?;
        Ok(Arc::new(transport))
    }
}

struct ActiveSender {
    track_id: String,
    sender: Arc<RTCRtpSender>,
}

/// webrtc-rs backed connection to one remote participant.
pub struct RtcPeerTransport {
    remote: PeerId,
    peer_connection: Arc<RTCPeerConnection>,
    senders: Mutex<HashMap<TrackKind, ActiveSender>>,
    local_tracks: Mutex<HashMap<String, Arc<TrackLocalStaticSample>>>,
    data_channel: Arc<Mutex<Option<Arc<RTCDataChannel>>>>,
    events: mpsc::Sender<TransportEvent>,
}

impl RtcPeerTransport {
    pub async fn new(
        remote: PeerId,
        ice_servers: &[IceServerConfig],
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Self, TransportError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        let data_channel = Arc::new(Mutex::new(None));

        let state_tx = events.clone();
        let uid_state = remote.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();

                Box::pin(async move {
                    info!("Peer connection state for {}: {:?}", uid, s);
                    let _ = tx
                        .send(TransportEvent::StateChanged(uid, map_state(s)))
                        .await;
                })
            },
        ));

        let ice_tx = events.clone();
        let uid_ice = remote.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let uid = uid_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(uid, candidate))
                    .await;
            })
        }));

        let nego_tx = events.clone();
        let uid_nego = remote.clone();
        peer_connection.on_negotiation_needed(Box::new(move || {
            let tx = nego_tx.clone();
            let uid = uid_nego.clone();

            Box::pin(async move {
                let _ = tx.send(TransportEvent::NegotiationNeeded(uid)).await;
            })
        }));

        let track_tx = events.clone();
        let uid_track = remote.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let uid = uid_track.clone();

                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => TrackKind::Audio,
                        _ => TrackKind::Video,
                    };
                    let remote_track = RemoteTrack {
                        id: track.id(),
                        kind,
                    };
                    let _ = tx
                        .send(TransportEvent::TrackArrived(uid, remote_track))
                        .await;
                })
            },
        ));

        let dc_tx = events.clone();
        let uid_dc = remote.clone();
        let dc_slot = Arc::clone(&data_channel);
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            let uid = uid_dc.clone();
            let slot = Arc::clone(&dc_slot);

            Box::pin(async move {
                debug!("Remote data channel '{}' from {}", dc.label(), uid);
                wire_data_channel(&uid, &dc, tx);
                *slot.lock().await = Some(dc);
            })
        }));

        Ok(Self {
            remote,
            peer_connection,
            senders: Mutex::new(HashMap::new()),
            local_tracks: Mutex::new(HashMap::new()),
            data_channel,
            events,
        })
    }

    async fn local_track(&self, track: &MediaTrack) -> Arc<dyn TrackLocal + Send + Sync> {
        let mut tracks = self.local_tracks.lock().await;
        tracks
            .entry(track.id.clone())
            .or_insert_with(|| {
                let mime_type = match track.kind() {
                    TrackKind::Audio => MIME_TYPE_OPUS,
                    TrackKind::Video => MIME_TYPE_VP8,
                };
                Arc::new(TrackLocalStaticSample::new(
                    RTCRtpCodecCapability {
                        mime_type: mime_type.to_owned(),
                        ..Default::default()
                    },
                    track.id.clone(),
                    LOCAL_STREAM_ID.to_owned(),
                ))
            })
            .clone()
    }
}

fn wire_data_channel(uid: &PeerId, dc: &Arc<RTCDataChannel>, events: mpsc::Sender<TransportEvent>) {
    let tx_open = events.clone();
    let uid_open = uid.clone();
    dc.on_open(Box::new(move || {
        let tx = tx_open.clone();
        let uid = uid_open.clone();

        Box::pin(async move {
            info!("Data channel open with {}", uid);
            let _ = tx.send(TransportEvent::DataChannelOpen(uid)).await;
        })
    }));

    let tx_msg = events;
    let uid_msg = uid.clone();
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = tx_msg.clone();
        let uid = uid_msg.clone();

        Box::pin(async move {
            let bytes = Bytes::from(msg.data.to_vec());
            let _ = tx.send(TransportEvent::Message(uid, bytes)).await;
        })
    }));
}

fn map_state(state: RTCPeerConnectionState) -> PeerConnectionState {
    match state {
        RTCPeerConnectionState::Connecting => PeerConnectionState::Connecting,
        RTCPeerConnectionState::Connected => PeerConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => PeerConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => PeerConnectionState::Failed,
        RTCPeerConnectionState::Closed => PeerConnectionState::Closed,
        _ => PeerConnectionState::New,
    }
}

#[async_trait]
impl PeerTransport for RtcPeerTransport {
    fn remote_id(&self) -> &PeerId {
        &self.remote
    }

    async fn create_offer(&self, ice_restart: bool) -> Result<SessionDescription, TransportError> {
        let options = RTCOfferOptions {
            ice_restart,
            ..Default::default()
        };
        let offer = self.peer_connection.create_offer(Some(options)).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, TransportError> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), TransportError> {
        let desc = match desc.kind {
            SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), TransportError> {
        let mut rollback = RTCSessionDescription::default();
        rollback.sdp_type = RTCSdpType::Rollback;
        self.peer_connection.set_local_description(rollback).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            ..Default::default()
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn sync_tracks(
        &self,
        stream: Option<&LocalStream>,
    ) -> Result<TrackChange, TransportError> {
        let mut senders = self.senders.lock().await;
        let mut change = TrackChange::default();

        for kind in [TrackKind::Audio, TrackKind::Video] {
            let wanted = stream.and_then(|s| s.track(kind));
            let current = senders.get(&kind).map(|s| s.track_id.clone());

            match (current, wanted) {
                (Some(id), Some(track)) if id == track.id => {}
                (Some(_), Some(track)) => {
                    let local = self.local_track(track).await;
                    if let Some(active) = senders.get_mut(&kind) {
                        active.sender.replace_track(Some(local)).await?;
                        active.track_id = track.id.clone();
                        change.replaced += 1;
                    }
                }
                (Some(_), None) => {
                    if let Some(active) = senders.remove(&kind) {
                        self.peer_connection.remove_track(&active.sender).await?;
                        change.removed += 1;
                    }
                }
                (None, Some(track)) => {
                    let local = self.local_track(track).await;
                    let sender = self.peer_connection.add_track(local).await?;
                    senders.insert(
                        kind,
                        ActiveSender {
                            track_id: track.id.clone(),
                            sender,
                        },
                    );
                    change.added += 1;
                }
                (None, None) => {}
            }
        }

        debug!("Tracks for {}: {:?}", self.remote, change);
        Ok(change)
    }

    async fn open_data_channel(&self, label: &str) -> Result<(), TransportError> {
        let dc = self.peer_connection.create_data_channel(label, None).await?;
        wire_data_channel(&self.remote, &dc, self.events.clone());
        *self.data_channel.lock().await = Some(dc);
        Ok(())
    }

    async fn send_data(&self, data: Bytes) -> Result<(), TransportError> {
        let dc = self
            .data_channel
            .lock()
            .await
            .clone()
            .ok_or(TransportError::DataChannelClosed)?;
        if dc.ready_state() != RTCDataChannelState::Open {
            return Err(TransportError::DataChannelClosed);
        }
        dc.send(&data).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
