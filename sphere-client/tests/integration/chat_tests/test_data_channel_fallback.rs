use bytes::Bytes;
use sphere_client::CallEvent;
use sphere_client::transport::TransportEvent;
use sphere_core::{ChatMessage, MediaState, Packet, ServerEvent};

use crate::integration::{init_tracing, participant, profile, start_call, test_config};
use crate::utils::{wait_for_event, wait_for_view, wait_until};

#[tokio::test]
async fn test_chat_falls_back_to_data_channel() {
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
    transport.set_data_open(true);

    call.signaling.set_failing(true);
    let sent = call.handle.send_chat("over the channel").await.unwrap();

    let packets = transport.sent_packets().await;
    assert_eq!(packets, vec![Packet::Chat(sent)]);
}

#[tokio::test]
async fn test_packets_from_peers_are_applied_once() {
    init_tracing();

    let mut call = start_call(test_config(profile(5, "me")));
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

    let message = ChatMessage::text(&profile(1, "ada"), "p2p hello");
    let packet = Packet::Chat(message.clone());
    let data = Bytes::from(postcard::to_allocvec(&packet).unwrap());
    transport
        .raise(TransportEvent::Message(ada.id.clone(), data))
        .await;
    // same message relayed by the server as well
    call.deliver(ServerEvent::ChatMessage { message }).await;

    wait_for_event(&mut call.events, |e| matches!(e, CallEvent::ChatReceived(_)))
        .await
        .expect("No chat event");

    let muted = MediaState {
        is_muted: true,
        ..MediaState::default()
    };
    let data = Bytes::from(postcard::to_allocvec(&Packet::MediaState(muted)).unwrap());
    transport
        .raise(TransportEvent::Message(ada.id.clone(), data))
        .await;

    let view = wait_for_view(&call.handle, |v| {
        v.participants.first().is_some_and(|p| p.media.is_muted)
    })
    .await
    .expect("Media state not applied");
    assert_eq!(view.chat.len(), 1);
}
