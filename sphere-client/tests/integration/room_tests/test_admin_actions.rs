use sphere_client::{CallEvent, ClientError};
use sphere_core::{ClientEvent, MediaState, Participant, PeerId, ServerEvent};

use crate::integration::{init_tracing, participant, profile, start_call, test_config};
use crate::utils::{wait_for_event, wait_for_view};

#[tokio::test]
async fn test_member_cannot_use_admin_actions() {
    init_tracing();

    let call = start_call(test_config(profile(5, "me")));
    let ada = participant(1, "ada");
    call.join_with(vec![ada.clone()]).await;

    let result = call.handle.admin_mute(ada.id.clone()).await;
    assert!(matches!(result, Err(ClientError::NotAdmin)));

    let result = call.handle.delete_room().await;
    assert!(matches!(result, Err(ClientError::NotCreator)));
}

#[tokio::test]
async fn test_promoted_member_can_moderate() {
    init_tracing();

    let mut call = start_call(test_config(profile(5, "me")));
    let ada = participant(1, "ada");
    call.join_with(vec![ada.clone()]).await;

    let mut you = Participant::new(&call.me, MediaState::default());
    you.is_admin = true;
    call.deliver(ServerEvent::ParticipantUpdated { participant: you })
        .await;
    wait_for_event(&mut call.events, |e| matches!(e, CallEvent::Notice(_)))
        .await
        .expect("No promotion notice");

    call.handle.admin_mute(ada.id.clone()).await.unwrap();
    call.handle.admin_toggle_camera(ada.id.clone()).await.unwrap();
    call.handle.toggle_room_lock().await.unwrap();

    let stranger = PeerId::new();
    let result = call.handle.admin_remove(stranger.clone()).await;
    assert!(matches!(result, Err(ClientError::UnknownParticipant(id)) if id == stranger));

    let events = call.signaling.events().await;
    assert!(events.contains(&ClientEvent::AdminMuteParticipant {
        target: ada.id.clone()
    }));
    assert!(events.contains(&ClientEvent::AdminToggleParticipantCamera {
        target: ada.id.clone()
    }));
    assert!(events.contains(&ClientEvent::ToggleRoomLock));
}

#[tokio::test]
async fn test_admin_mute_silences_local_audio() {
    init_tracing();

    let call = start_call(test_config(profile(5, "me")));
    call.join_with(vec![participant(1, "ada")]).await;

    call.deliver(ServerEvent::AdminMuted {
        by: profile(1, "ada").id,
    })
    .await;

    let view = wait_for_view(&call.handle, |v| v.me.media.is_muted)
        .await
        .expect("Not muted");
    assert!(view.me.media.is_muted);

    let stream = call.handle.local_stream().borrow().clone().unwrap();
    assert!(!stream.audio_track().unwrap().enabled);
}

#[tokio::test]
async fn test_shared_room_state_is_applied() {
    init_tracing();

    let mut call = start_call(test_config(profile(5, "me")));
    call.join_with(vec![]).await;

    call.deliver(ServerEvent::NotesUpdate {
        notes: "chapter 4".into(),
        updated_by: Some(profile(1, "ada").id),
    })
    .await;
    call.deliver(ServerEvent::RoomLockStatus { locked: true })
        .await;

    wait_for_event(&mut call.events, |e| *e == CallEvent::LockChanged(true))
        .await
        .expect("No lock event");

    let view = call.handle.snapshot().await.unwrap();
    assert_eq!(view.notes, "chapter 4");
    assert!(view.locked);

    call.handle.update_notes("chapter 5").await.unwrap();
    assert!(
        call.signaling
            .events()
            .await
            .contains(&ClientEvent::NotesUpdate {
                notes: "chapter 5".into()
            })
    );
}

#[tokio::test]
async fn test_admin_camera_toggle_turns_camera_off() {
    init_tracing();

    let mut call = start_call(test_config(profile(5, "me")));
    call.join_with(vec![participant(1, "ada")]).await;

    call.deliver(ServerEvent::AdminCameraToggled {
        by: profile(1, "ada").id,
    })
    .await;

    let view = wait_for_view(&call.handle, |v| v.me.media.is_camera_off)
        .await
        .expect("Camera still on");
    assert!(!view.me.media.is_screen_sharing);

    wait_for_event(&mut call.events, |e| {
        matches!(e, CallEvent::Notice(n) if n.message.contains("camera off"))
    })
    .await
    .expect("No camera notice");
}

#[tokio::test]
async fn test_admin_camera_toggle_ignored_while_sharing() {
    init_tracing();

    let mut call = start_call(test_config(profile(5, "me")));
    call.join_with(vec![participant(1, "ada")]).await;
    call.handle.toggle_screen_share().await.unwrap();

    call.deliver(ServerEvent::AdminCameraToggled {
        by: profile(1, "ada").id,
    })
    .await;
    call.deliver(ServerEvent::NotesUpdate {
        notes: "after toggle".into(),
        updated_by: None,
    })
    .await;

    let view = wait_for_view(&call.handle, |v| v.notes == "after toggle")
        .await
        .expect("Notes not applied");
    assert!(view.me.media.is_screen_sharing);
    assert!(view.me.media.is_camera_off);

    while let Ok(event) = call.events.try_recv() {
        assert!(
            !matches!(&event, CallEvent::Notice(n) if n.message.contains("An admin turned")),
            "unexpected {:?}",
            event
        );
    }
}
