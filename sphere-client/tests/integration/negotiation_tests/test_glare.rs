use sphere_client::negotiation::NegotiationState;
use sphere_core::{ClientEvent, SdpKind, ServerEvent, SessionDescription};

use crate::integration::{init_tracing, participant, profile, start_call, test_config};
use crate::utils::{TransportCall, wait_for_view, wait_until};

#[tokio::test]
async fn test_polite_peer_rolls_back_and_reoffers() {
    init_tracing();

    // 1 < 9: we are the polite side
    let call = start_call(test_config(profile(1, "me")));
    let remote = participant(9, "remote");
    call.join_with(vec![remote.clone()]).await;

    wait_for_view(&call.handle, |v| {
        v.peers
            .first()
            .is_some_and(|p| p.negotiation == NegotiationState::OfferSent)
    })
    .await
    .expect("Offer never sent");

    call.deliver(ServerEvent::Signal {
        from: remote.id.clone(),
        description: SessionDescription::offer("colliding-offer"),
    })
    .await;

    let transport = call.transports.transport_for(&remote.id).await.unwrap();
    let probe = transport.clone();
    wait_until(|| {
        let probe = probe.clone();
        async move { probe.offers().await.len() == 2 }
    })
    .await
    .expect("Our offer was not sent again");

    let calls = transport.calls().await;
    let rollback = calls.iter().position(|c| *c == TransportCall::Rollback).unwrap();
    let applied = calls
        .iter()
        .position(|c| *c == TransportCall::SetRemote(SdpKind::Offer))
        .unwrap();
    let answered = calls
        .iter()
        .position(|c| *c == TransportCall::CreateAnswer)
        .unwrap();
    assert!(rollback < applied && applied < answered);

    let answers = call
        .signaling
        .count(|e| {
            matches!(e, ClientEvent::Signal { description, .. } if description.kind == SdpKind::Answer)
        })
        .await;
    assert_eq!(answers, 1);
}

#[tokio::test]
async fn test_impolite_peer_ignores_colliding_offer() {
    init_tracing();

    // 9 > 1: we are the impolite side
    let call = start_call(test_config(profile(9, "me")));
    let remote = participant(1, "remote");
    call.join_with(vec![remote.clone()]).await;

    wait_for_view(&call.handle, |v| {
        v.peers
            .first()
            .is_some_and(|p| p.negotiation == NegotiationState::OfferSent)
    })
    .await
    .expect("Offer never sent");

    call.deliver(ServerEvent::Signal {
        from: remote.id.clone(),
        description: SessionDescription::offer("colliding-offer"),
    })
    .await;
    call.deliver(ServerEvent::Signal {
        from: remote.id.clone(),
        description: SessionDescription::answer("their-answer"),
    })
    .await;

    wait_for_view(&call.handle, |v| {
        v.peers[0].negotiation == NegotiationState::Stable
    })
    .await
    .expect("Answer not applied");

    let transport = call.transports.transport_for(&remote.id).await.unwrap();
    let calls = transport.calls().await;
    assert!(!calls.contains(&TransportCall::Rollback));
    assert!(!calls.contains(&TransportCall::CreateAnswer));
    assert_eq!(transport.count(&TransportCall::SetRemote(SdpKind::Offer)).await, 0);
    assert_eq!(transport.count(&TransportCall::SetRemote(SdpKind::Answer)).await, 1);
}

#[tokio::test]
async fn test_stale_answer_is_dropped() {
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
        description: SessionDescription::answer("unexpected"),
    })
    .await;

    let view = wait_for_view(&call.handle, |v| v.peers.len() == 1)
        .await
        .expect("No connection");
    assert_eq!(view.peers[0].negotiation, NegotiationState::Stable);

    let transport = call.transports.transport_for(&newcomer.id).await.unwrap();
    assert_eq!(transport.count(&TransportCall::SetRemote(SdpKind::Answer)).await, 0);
}
