use sphere_core::{ClientEvent, MediaState, Packet, PeerId};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::engine::{CallEngine, CallEvent, NoticeLevel};
use crate::error::{ClientError, MediaError};
use crate::media::{LocalStream, MediaConstraints, MediaDevices, MediaEvent, TrackKind};

/// Camera and microphone first, then microphone alone, then nothing.
async fn acquire_initial_media(
    devices: &dyn MediaDevices,
    want_video: bool,
) -> (LocalStream, Option<String>) {
    let constraints = MediaConstraints {
        audio: true,
        video: want_video,
    };
    match devices.get_user_media(constraints).await {
        Ok(stream) => (stream, None),
        Err(e) if want_video => {
            warn!("Camera and microphone unavailable: {}", e);
            match devices.get_user_media(MediaConstraints::AUDIO_ONLY).await {
                Ok(stream) => (
                    stream,
                    Some(format!("Camera unavailable ({}). Joined with audio only.", e)),
                ),
                Err(e) => (
                    LocalStream::empty(),
                    Some(format!("No camera or microphone available ({}).", e)),
                ),
            }
        }
        Err(e) => (
            LocalStream::empty(),
            Some(format!("Microphone unavailable ({}).", e)),
        ),
    }
}

impl CallEngine {
    pub(super) fn start_media_acquisition(&self) {
        let devices = Arc::clone(&self.devices);
        let tx = self.media_tx.clone();
        let want_video = !self.config.start_camera_off;

        tokio::spawn(async move {
            let (stream, notice) = acquire_initial_media(devices.as_ref(), want_video).await;
            let _ = tx.send(MediaEvent::Acquired { stream, notice }).await;
        });
    }

    pub(super) async fn handle_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::Acquired { stream, notice } => {
                let stream = if self.config.start_muted {
                    stream.with_audio_enabled(false)
                } else {
                    stream
                };
                self.me.media.is_muted = self.config.start_muted || stream.audio_track().is_none();
                self.me.media.is_camera_off = stream.video_track().is_none();
                self.media_ready = true;

                info!("Local media ready: {} track(s)", stream.tracks().len());
                if let Some(message) = notice {
                    self.notify(NoticeLevel::Warning, message);
                }

                self.update_peer_connection_tracks(stream).await;
                self.broadcast_media_state().await;
                self.replay_deferred_signals().await;
            }

            MediaEvent::TrackEnded { track_id } => {
                let is_screen = self.me.media.is_screen_sharing
                    && self
                        .local_stream
                        .as_ref()
                        .and_then(|s| s.video_track())
                        .is_some_and(|t| t.id == track_id);
                if !is_screen {
                    debug!("Ignoring end of inactive track {}", track_id);
                    return;
                }
                info!("Screen capture ended outside the app");
                if let Err(e) = self.stop_screen_share().await {
                    warn!("Failed to stop screen share: {}", e);
                }
            }
        }
    }

    pub(super) async fn toggle_mute(&mut self) -> Result<MediaState, ClientError> {
        let Some(stream) = self.local_stream.clone() else {
            return Err(ClientError::MediaNotReady);
        };
        let muted = !self.me.media.is_muted;
        if !muted && stream.audio_track().is_none() {
            return Err(MediaError::DeviceUnavailable("microphone").into());
        }

        self.me.media.is_muted = muted;
        self.update_peer_connection_tracks(stream.with_audio_enabled(!muted))
            .await;
        self.broadcast_media_state().await;
        Ok(self.me.media)
    }

    pub(super) async fn toggle_camera(&mut self) -> Result<MediaState, ClientError> {
        if !self.media_ready {
            return Err(ClientError::MediaNotReady);
        }
        if self.me.media.is_screen_sharing {
            self.notify(
                NoticeLevel::Warning,
                "Stop screen sharing before turning the camera on",
            );
            return Err(ClientError::ScreenShareActive);
        }

        let stream = self.local_stream.clone().unwrap_or_else(LocalStream::empty);

        if !self.me.media.is_camera_off {
            if let Some(video) = stream.video_track() {
                self.devices.stop_track(video).await;
            }
            self.me.media.is_camera_off = true;
            self.update_peer_connection_tracks(stream.without(TrackKind::Video))
                .await;
        } else {
            let fresh = match self.devices.get_user_media(MediaConstraints::VIDEO_ONLY).await {
                Ok(s) => s,
                Err(e) => {
                    self.notify(NoticeLevel::Warning, format!("Camera unavailable: {}", e));
                    return Err(e.into());
                }
            };
            let Some(video) = fresh.video_track().cloned() else {
                return Err(MediaError::DeviceUnavailable("camera").into());
            };
            self.me.media.is_camera_off = false;
            self.update_peer_connection_tracks(stream.with_track(video))
                .await;
        }

        self.broadcast_media_state().await;
        Ok(self.me.media)
    }

    pub(super) async fn toggle_screen_share(&mut self) -> Result<MediaState, ClientError> {
        if self.me.media.is_screen_sharing {
            self.stop_screen_share().await
        } else {
            self.start_screen_share().await
        }
    }

    async fn start_screen_share(&mut self) -> Result<MediaState, ClientError> {
        if !self.media_ready {
            return Err(ClientError::MediaNotReady);
        }

        let display = match self.devices.get_display_media(self.media_tx.clone()).await {
            Ok(s) => s,
            Err(e) => {
                self.notify(
                    NoticeLevel::Warning,
                    format!("Screen sharing unavailable: {}", e),
                );
                return Err(e.into());
            }
        };
        let Some(screen) = display.video_track().cloned() else {
            return Err(MediaError::DeviceUnavailable("screen").into());
        };

        let current = self.local_stream.clone().unwrap_or_else(LocalStream::empty);
        if let Some(camera) = current.video_track() {
            self.devices.stop_track(camera).await;
        }

        self.camera_before_share = !self.me.media.is_camera_off;
        self.me.media.is_camera_off = true;
        self.me.media.is_screen_sharing = true;
        info!("Screen sharing started");

        self.update_peer_connection_tracks(current.with_track(screen))
            .await;
        if self.phase.is_joined() {
            self.emit_signal(ClientEvent::ScreenShareStart).await;
        }
        self.broadcast_media_state().await;
        self.emit_event(CallEvent::ScreenShareFocused(self.local_id().clone()));
        Ok(self.me.media)
    }

    /// Ends sharing whether the user asked or the capture ended on its own.
    pub(super) async fn stop_screen_share(&mut self) -> Result<MediaState, ClientError> {
        if !self.me.media.is_screen_sharing {
            return Ok(self.me.media);
        }

        let current = self.local_stream.clone().unwrap_or_else(LocalStream::empty);
        if let Some(screen) = current.video_track() {
            self.devices.stop_track(screen).await;
        }

        let mut next = current.without(TrackKind::Video);
        self.me.media.is_screen_sharing = false;
        self.me.media.is_camera_off = true;

        if self.camera_before_share {
            match self.devices.get_user_media(MediaConstraints::VIDEO_ONLY).await {
                Ok(fresh) => {
                    if let Some(video) = fresh.video_track().cloned() {
                        next = next.with_track(video);
                        self.me.media.is_camera_off = false;
                    }
                }
                Err(e) => self.notify(
                    NoticeLevel::Warning,
                    format!("Camera unavailable after screen sharing: {}", e),
                ),
            }
        }
        info!("Screen sharing stopped");

        self.update_peer_connection_tracks(next).await;
        if self.phase.is_joined() {
            self.emit_signal(ClientEvent::ScreenShareStop).await;
        }
        self.broadcast_media_state().await;
        Ok(self.me.media)
    }

    /// Falls back to data channels when signaling is unavailable.
    pub(super) async fn broadcast_media_state(&mut self) {
        if !self.phase.is_joined() || !self.media_ready {
            return;
        }
        let media = self.me.media;
        if let Err(e) = self
            .signaling
            .emit(ClientEvent::MediaStateUpdate { media })
            .await
        {
            warn!("Media state over signaling failed ({}), using data channels", e);
            self.broadcast_packet(&Packet::MediaState(media)).await;
        }
    }

    pub(super) fn apply_remote_media(&mut self, user_id: &PeerId, media: MediaState) {
        if !self.participants.set_media(user_id, media) {
            debug!("Media update for unknown participant {}", user_id);
            return;
        }
        self.emit_event(CallEvent::MediaChanged {
            user_id: user_id.clone(),
            media,
        });
    }

    pub(super) async fn emit_signal(&self, event: ClientEvent) {
        if let Err(e) = self.signaling.emit(event).await {
            warn!("Failed to send signaling event: {}", e);
        }
    }
}
