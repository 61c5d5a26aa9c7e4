use sphere_client::{CallEvent, RoomPhase};
use sphere_core::{ClientEvent, ServerEvent};

use crate::integration::{init_tracing, participant, profile, start_call, test_config};
use crate::utils::{TransportCall, wait_for_event, wait_for_view, wait_until};

#[tokio::test]
async fn test_user_disconnect_closes_connection() {
    init_tracing();

    let mut call = start_call(test_config(profile(5, "me")));
    let ada = participant(1, "ada");
    let grace = participant(2, "grace");
    call.join_with(vec![ada.clone(), grace.clone()]).await;

    call.deliver(ServerEvent::UserDisconnected {
        user_id: ada.id.clone(),
    })
    .await;

    let left = wait_for_event(&mut call.events, |e| matches!(e, CallEvent::ParticipantLeft(_)))
        .await
        .expect("No leave event");
    assert_eq!(left, CallEvent::ParticipantLeft(ada.id.clone()));

    let view = wait_for_view(&call.handle, |v| v.peers.len() == 1)
        .await
        .expect("Connection not removed");
    assert_eq!(view.peers[0].id, grace.id);
    assert_eq!(view.participants.len(), 1);

    let transport = call.transports.transport_for(&ada.id).await.unwrap();
    assert_eq!(transport.count(&TransportCall::Close).await, 1);
}

#[tokio::test]
async fn test_rejoining_user_gets_fresh_connection() {
    init_tracing();

    let call = start_call(test_config(profile(5, "me")));
    let ada = participant(1, "ada");
    call.join_with(vec![ada.clone()]).await;

    call.deliver(ServerEvent::UserDisconnected {
        user_id: ada.id.clone(),
    })
    .await;
    call.deliver(ServerEvent::UserConnected {
        participant: ada.clone(),
    })
    .await;

    let transports = call.transports.clone();
    let id = ada.id.clone();
    wait_until(|| {
        let transports = transports.clone();
        let id = id.clone();
        async move { transports.created_for(&id).await == 2 }
    })
    .await
    .expect("No fresh connection");

    let view = call.handle.snapshot().await.unwrap();
    assert_eq!(view.peers.len(), 1);
}

#[tokio::test]
async fn test_kicked_user_tears_everything_down() {
    init_tracing();

    let mut call = start_call(test_config(profile(5, "me")));
    let ada = participant(1, "ada");
    call.join_with(vec![ada.clone()]).await;

    call.deliver(ServerEvent::KickedFromRoom {
        reason: Some("Removed by admin".into()),
    })
    .await;

    let exited = wait_for_event(&mut call.events, |e| matches!(e, CallEvent::Exited(_)))
        .await
        .expect("Engine did not exit");
    assert!(matches!(exited, CallEvent::Exited(RoomPhase::Kicked { .. })));

    let transport = call.transports.transport_for(&ada.id).await.unwrap();
    assert_eq!(transport.count(&TransportCall::Close).await, 1);
    assert_eq!(call.devices.live_tracks().await, 0);
    assert!(call.handle.local_stream().borrow().is_none());
}

#[tokio::test]
async fn test_leave_emits_leave_room() {
    init_tracing();

    let mut call = start_call(test_config(profile(5, "me")));
    call.join_with(vec![participant(1, "ada")]).await;

    call.handle.leave().await.expect("Leave failed");

    wait_for_event(&mut call.events, |e| {
        *e == CallEvent::Exited(RoomPhase::Left)
    })
    .await
    .expect("Engine did not exit");
    assert_eq!(
        call.signaling
            .count(|e| matches!(e, ClientEvent::LeaveRoom))
            .await,
        1
    );
}

#[tokio::test]
async fn test_deleted_room_ends_call() {
    init_tracing();

    let mut call = start_call(test_config(profile(5, "me")));
    call.join_with(vec![]).await;

    call.deliver(ServerEvent::RoomDeleted).await;

    wait_for_event(&mut call.events, |e| {
        *e == CallEvent::Exited(RoomPhase::RoomDeleted)
    })
    .await
    .expect("Engine did not exit");
}
