use sphere_client::negotiation::NegotiationState;
use sphere_core::{ClientEvent, SdpKind, ServerEvent, SessionDescription};

use crate::integration::{init_tracing, participant, profile, start_call, test_config};
use crate::utils::{TransportCall, wait_for_view, wait_until};

#[tokio::test]
async fn test_joiner_offers_and_applies_answer() {
    init_tracing();

    let call = start_call(test_config(profile(5, "me")));
    let ada = participant(1, "ada");
    call.join_with(vec![ada.clone()]).await;

    let transports = call.transports.clone();
    let id = ada.id.clone();
    wait_until(|| {
        let transports = transports.clone();
        let id = id.clone();
        async move { transports.transport_for(&id).await.is_some() }
    })
    .await
    .expect("No transport");
    let transport = call.transports.transport_for(&ada.id).await.unwrap();

    let view = wait_for_view(&call.handle, |v| {
        v.peers
            .first()
            .is_some_and(|p| p.negotiation == NegotiationState::OfferSent)
    })
    .await
    .expect("Offer never sent");
    assert_eq!(view.peers.len(), 1);

    call.deliver(ServerEvent::Signal {
        from: ada.id.clone(),
        description: SessionDescription::answer("remote-answer"),
    })
    .await;

    wait_for_view(&call.handle, |v| {
        v.peers[0].negotiation == NegotiationState::Stable
    })
    .await
    .expect("Answer not applied");

    let calls = transport.calls().await;
    assert!(calls.contains(&TransportCall::OpenDataChannel("chat".into())));
    assert!(calls.contains(&TransportCall::SetRemote(SdpKind::Answer)));
    assert_eq!(transport.offers().await, vec![false]);
}

#[tokio::test]
async fn test_existing_member_answers_newcomer() {
    init_tracing();

    let call = start_call(test_config(profile(5, "me")));
    call.join_with(vec![]).await;

    let newcomer = participant(8, "newcomer");
    call.deliver(ServerEvent::UserConnected {
        participant: newcomer.clone(),
    })
    .await;
    call.deliver(ServerEvent::Signal {
        from: newcomer.id.clone(),
        description: SessionDescription::offer("remote-offer"),
    })
    .await;

    let signaling = call.signaling.clone();
    let id = newcomer.id.clone();
    wait_until(|| {
        let signaling = signaling.clone();
        let id = id.clone();
        async move {
            signaling
                .count(|e| {
                    matches!(e, ClientEvent::Signal { to, description }
                        if *to == id && description.kind == SdpKind::Answer)
                })
                .await
                == 1
        }
    })
    .await
    .expect("No answer sent");

    let transport = call.transports.transport_for(&newcomer.id).await.unwrap();
    assert_eq!(transport.offers().await, Vec::<bool>::new());
    assert_eq!(call.transports.created_for(&newcomer.id).await, 1);
}

#[tokio::test]
async fn test_no_duplicate_connection_per_peer() {
    init_tracing();

    let call = start_call(test_config(profile(5, "me")));
    let ada = participant(1, "ada");
    call.join_with(vec![ada.clone()]).await;

    call.deliver(ServerEvent::UserConnected {
        participant: ada.clone(),
    })
    .await;
    call.deliver(ServerEvent::Signal {
        from: ada.id.clone(),
        description: SessionDescription::answer("remote-answer"),
    })
    .await;

    wait_for_view(&call.handle, |v| {
        v.peers
            .first()
            .is_some_and(|p| p.negotiation == NegotiationState::Stable)
    })
    .await
    .expect("Answer not applied");

    assert_eq!(call.transports.created_for(&ada.id).await, 1);
    let view = call.handle.snapshot().await.unwrap();
    assert_eq!(view.participants.len(), 1);
}

#[tokio::test]
async fn test_offer_before_media_is_deferred() {
    init_tracing();

    let call = start_call(test_config(profile(5, "me")));
    let ada = participant(1, "ada");

    // arrives before the acquisition task reports back
    call.deliver(ServerEvent::Signal {
        from: ada.id.clone(),
        description: SessionDescription::offer("early-offer"),
    })
    .await;

    let transports = call.transports.clone();
    let id = ada.id.clone();
    wait_until(|| {
        let transports = transports.clone();
        let id = id.clone();
        async move {
            match transports.transport_for(&id).await {
                Some(t) => t.count(&TransportCall::CreateAnswer).await == 1,
                None => false,
            }
        }
    })
    .await
    .expect("Deferred offer never answered");

    let transport = call.transports.transport_for(&ada.id).await.unwrap();
    let calls = transport.calls().await;
    let synced = calls
        .iter()
        .position(|c| matches!(c, TransportCall::SyncTracks { tracks: 2 }))
        .expect("Local tracks not attached");
    let answered = calls
        .iter()
        .position(|c| *c == TransportCall::CreateAnswer)
        .unwrap();
    assert!(synced < answered);
}
