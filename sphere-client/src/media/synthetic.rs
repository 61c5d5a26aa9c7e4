use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use crate::error::MediaError;
use crate::media::devices::{MediaConstraints, MediaDevices, MediaEvent};
use crate::media::stream::{LocalStream, MediaTrack, TrackSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    pub camera: bool,
    pub microphone: bool,
    pub screen: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            camera: true,
            microphone: true,
            screen: true,
        }
    }
}

struct DisplayCapture {
    track_id: String,
    events: mpsc::Sender<MediaEvent>,
}

struct SyntheticState {
    permissions: Permissions,
    live: HashSet<String>,
    display: Option<DisplayCapture>,
}

/// Device layer producing track descriptors without touching hardware.
/// Used by the headless client.
pub struct SyntheticMediaDevices {
    state: Mutex<SyntheticState>,
}

impl SyntheticMediaDevices {
    pub fn new() -> Self {
        Self::with_permissions(Permissions::default())
    }

    pub fn with_permissions(permissions: Permissions) -> Self {
        Self {
            state: Mutex::new(SyntheticState {
                permissions,
                live: HashSet::new(),
                display: None,
            }),
        }
    }

    pub async fn set_permissions(&self, permissions: Permissions) {
        self.state.lock().await.permissions = permissions;
    }

    /// Ends the running screen capture as if the user pressed the
    /// platform's "stop sharing" control.
    pub async fn end_screen_share(&self) -> bool {
        let capture = {
            let mut state = self.state.lock().await;
            let Some(capture) = state.display.take() else {
                return false;
            };
            state.live.remove(&capture.track_id);
            capture
        };

        capture
            .events
            .send(MediaEvent::TrackEnded {
                track_id: capture.track_id,
            })
            .await
            .is_ok()
    }

    pub async fn live_tracks(&self) -> usize {
        self.state.lock().await.live.len()
    }
}

impl Default for SyntheticMediaDevices {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaDevices for SyntheticMediaDevices {
    async fn get_user_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<LocalStream, MediaError> {
        let mut state = self.state.lock().await;
        if constraints.video && !state.permissions.camera {
            return Err(MediaError::PermissionDenied("camera"));
        }
        if constraints.audio && !state.permissions.microphone {
            return Err(MediaError::PermissionDenied("microphone"));
        }

        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(MediaTrack::new(TrackSource::Microphone, "synthetic microphone"));
        }
        if constraints.video {
            tracks.push(MediaTrack::new(TrackSource::Camera, "synthetic camera"));
        }
        for track in &tracks {
            state.live.insert(track.id.clone());
        }

        debug!("Synthetic capture started: {} tracks", tracks.len());
        Ok(LocalStream::new(tracks))
    }

    async fn get_display_media(
        &self,
        events: mpsc::Sender<MediaEvent>,
    ) -> Result<LocalStream, MediaError> {
        let mut state = self.state.lock().await;
        if !state.permissions.screen {
            return Err(MediaError::PermissionDenied("screen"));
        }

        let track = MediaTrack::new(TrackSource::Screen, "synthetic screen");
        state.live.insert(track.id.clone());
        state.display = Some(DisplayCapture {
            track_id: track.id.clone(),
            events,
        });

        Ok(LocalStream::new(vec![track]))
    }

    async fn stop_track(&self, track: &MediaTrack) {
        let mut state = self.state.lock().await;
        state.live.remove(&track.id);
        if state
            .display
            .as_ref()
            .is_some_and(|d| d.track_id == track.id)
        {
            state.display = None;
        }
    }
}
