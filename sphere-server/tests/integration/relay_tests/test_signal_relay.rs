use sphere_core::{
    ChatMessage, ClientEvent, IceCandidate, MediaState, RoomPrivacy, ServerEvent,
    SessionDescription, UserProfile,
};
use sphere_server::RoomSettings;

use crate::integration::{create_test_room, init_tracing};
use crate::utils::wait_for_event;

#[tokio::test]
async fn test_signal_relay() {
    init_tracing();

    let mut room = create_test_room(RoomSettings::default());
    let ada = UserProfile::new("ada");
    let bob = UserProfile::new("bob");
    room.join(&ada, RoomPrivacy::Public).await;
    room.join(&bob, RoomPrivacy::Public).await;
    wait_for_event(&mut room.signal_rx, &bob.id, |e| {
        matches!(e, ServerEvent::RoomJoinedSuccessfully { .. })
    })
    .await
    .expect("Join failed");

    room.event(
        &ada.id,
        ClientEvent::Signal {
            to: bob.id.clone(),
            description: SessionDescription::offer("v=0 offer"),
        },
    )
    .await;
    let relayed = wait_for_event(&mut room.signal_rx, &bob.id, |e| {
        matches!(e, ServerEvent::Signal { .. })
    })
    .await
    .expect("Offer was not relayed");
    assert_eq!(
        relayed,
        ServerEvent::Signal {
            from: ada.id.clone(),
            description: SessionDescription::offer("v=0 offer"),
        }
    );

    let candidate = IceCandidate {
        candidate: "candidate:1 1 udp 2122260223 10.0.0.2 50000 typ host".into(),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
    };
    room.event(
        &bob.id,
        ClientEvent::IceCandidate {
            to: ada.id.clone(),
            candidate: candidate.clone(),
        },
    )
    .await;
    wait_for_event(&mut room.signal_rx, &ada.id, |e| {
        matches!(e, ServerEvent::IceCandidate { from, candidate: c }
            if *from == bob.id && *c == candidate)
    })
    .await
    .expect("Candidate was not relayed");

    let media = MediaState {
        is_muted: true,
        ..MediaState::default()
    };
    room.event(&bob.id, ClientEvent::MediaStateUpdate { media }).await;
    wait_for_event(&mut room.signal_rx, &ada.id, |e| {
        matches!(e, ServerEvent::MediaStateChanged { user_id, media: m }
            if *user_id == bob.id && m.is_muted)
    })
    .await
    .expect("Media state was not broadcast");

    // Chat reaches everyone, the sender included
    room.event(
        &ada.id,
        ClientEvent::ChatMessage {
            message: ChatMessage::text(&ada, "page 42"),
        },
    )
    .await;
    for peer in [&ada.id, &bob.id] {
        wait_for_event(&mut room.signal_rx, peer, |e| {
            matches!(e, ServerEvent::ChatMessage { message } if message.message == "page 42")
        })
        .await
        .expect("Chat was not broadcast");
    }
}
