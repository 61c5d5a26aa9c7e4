use std::time::Duration;

use sphere_client::negotiation::NegotiationState;
use sphere_client::transport::{PeerConnectionState, TransportEvent};
use sphere_client::{CallEvent, NoticeLevel};
use sphere_core::{ServerEvent, SessionDescription};

use crate::integration::{TestCall, init_tracing, participant, profile, start_call, test_config};
use crate::utils::{MockTransport, TransportCall, wait_for_event, wait_until};
use std::sync::Arc;

async fn connected_call(max_ice_restarts: Option<u32>) -> (TestCall, Arc<MockTransport>) {
    let mut config = test_config(profile(5, "me"));
    config.max_ice_restarts = max_ice_restarts;
    let call = start_call(config);
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

    call.deliver(ServerEvent::Signal {
        from: ada.id.clone(),
        description: SessionDescription::answer("remote-answer"),
    })
    .await;

    let transport = call.transports.transport_for(&ada.id).await.unwrap();
    transport
        .raise(TransportEvent::StateChanged(
            ada.id.clone(),
            PeerConnectionState::Connected,
        ))
        .await;
    (call, transport)
}

#[tokio::test(start_paused = true)]
async fn test_failed_connection_restarts_ice_after_delay() {
    init_tracing();

    let (call, transport) = connected_call(None).await;
    let ada = transport.remote.clone();

    transport
        .raise(TransportEvent::StateChanged(
            ada.clone(),
            PeerConnectionState::Failed,
        ))
        .await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(transport.offers().await, vec![false]);

    let probe = transport.clone();
    wait_until(|| {
        let probe = probe.clone();
        async move { probe.offers().await == vec![false, true] }
    })
    .await
    .expect("No ICE restart offer");

    transport
        .raise(TransportEvent::StateChanged(
            ada.clone(),
            PeerConnectionState::Connected,
        ))
        .await;
    call.deliver(ServerEvent::Signal {
        from: ada.clone(),
        description: SessionDescription::answer("restart-answer"),
    })
    .await;

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(transport.offers().await, vec![false, true]);
}

#[tokio::test(start_paused = true)]
async fn test_restarts_stop_at_configured_limit() {
    init_tracing();

    let (mut call, transport) = connected_call(Some(1)).await;
    let ada = transport.remote.clone();

    transport
        .raise(TransportEvent::StateChanged(
            ada.clone(),
            PeerConnectionState::Failed,
        ))
        .await;

    let notice = wait_for_event(&mut call.events, |e| {
        matches!(e, CallEvent::Notice(n) if n.level == NoticeLevel::Warning)
    })
    .await
    .expect("No give-up notice");
    assert!(matches!(notice, CallEvent::Notice(_)));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(transport.offers().await.iter().filter(|r| **r).count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_restart_offer_is_retried() {
    init_tracing();

    let (call, transport) = connected_call(None).await;
    let ada = transport.remote.clone();

    transport
        .raise(TransportEvent::StateChanged(
            ada.clone(),
            PeerConnectionState::Failed,
        ))
        .await;

    // the remote never answers
    tokio::time::sleep(Duration::from_secs(21)).await;

    let restarts = transport.offers().await.iter().filter(|r| **r).count();
    assert!(restarts > 1, "only {} restart offer(s) sent", restarts);
    assert_eq!(
        transport.count(&TransportCall::Rollback).await,
        restarts - 1
    );

    let view = call.handle.snapshot().await.unwrap();
    let peer = view.peers.iter().find(|p| p.id == ada).unwrap();
    assert_eq!(peer.ice_restarts as usize, restarts);
    assert_eq!(peer.negotiation, NegotiationState::OfferSent);
}

#[tokio::test(start_paused = true)]
async fn test_limit_counts_only_restart_offers_sent() {
    init_tracing();

    let (mut call, transport) = connected_call(Some(3)).await;
    let ada = transport.remote.clone();

    transport
        .raise(TransportEvent::StateChanged(
            ada.clone(),
            PeerConnectionState::Failed,
        ))
        .await;

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(transport.offers().await.iter().filter(|r| **r).count(), 3);

    wait_for_event(&mut call.events, |e| {
        matches!(e, CallEvent::Notice(n) if n.level == NoticeLevel::Warning)
    })
    .await
    .expect("No give-up notice");
}
