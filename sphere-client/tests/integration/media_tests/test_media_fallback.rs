use sphere_client::media::Permissions;
use sphere_client::{CallEvent, ClientError, MediaError, NoticeLevel};

use crate::integration::{init_tracing, profile, start_call, start_call_with, test_config};
use crate::utils::{wait_for_event, wait_for_view};

#[tokio::test]
async fn test_camera_denied_falls_back_to_audio() {
    init_tracing();

    let permissions = Permissions {
        camera: false,
        ..Permissions::default()
    };
    let mut call = start_call_with(test_config(profile(5, "me")), permissions);

    let notice = wait_for_event(&mut call.events, |e| matches!(e, CallEvent::Notice(_)))
        .await
        .expect("No fallback notice");
    match notice {
        CallEvent::Notice(n) => {
            assert_eq!(n.level, NoticeLevel::Warning);
            assert!(n.message.contains("audio only"));
        }
        _ => unreachable!(),
    }

    let view = wait_for_view(&call.handle, |v| v.media_ready)
        .await
        .expect("Media not ready");
    assert!(view.me.media.is_camera_off);
    assert!(!view.me.media.is_muted);

    let stream = call.handle.local_stream().borrow().clone().unwrap();
    assert!(stream.audio_track().is_some());
    assert!(stream.video_track().is_none());

    let result = call.handle.toggle_camera().await;
    assert!(matches!(
        result,
        Err(ClientError::Media(MediaError::PermissionDenied("camera")))
    ));
}

#[tokio::test]
async fn test_no_devices_joins_without_media() {
    init_tracing();

    let permissions = Permissions {
        camera: false,
        microphone: false,
        screen: true,
    };
    let call = start_call_with(test_config(profile(5, "me")), permissions);

    let view = wait_for_view(&call.handle, |v| v.media_ready)
        .await
        .expect("Media not ready");
    assert!(view.me.media.is_muted);
    assert!(view.me.media.is_camera_off);

    let stream = call.handle.local_stream().borrow().clone().unwrap();
    assert!(stream.is_empty());
}

#[tokio::test]
async fn test_toggles_before_media_are_refused() {
    init_tracing();

    let call = start_call(test_config(profile(5, "me")));
    let early = call.handle.toggle_mute().await;

    // the acquisition task may already have finished
    if let Err(e) = early {
        assert!(matches!(e, ClientError::MediaNotReady));
    }
}
