use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::MediaError;
use crate::media::stream::{LocalStream, MediaTrack};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl MediaConstraints {
    pub const AUDIO_VIDEO: Self = Self {
        audio: true,
        video: true,
    };
    pub const AUDIO_ONLY: Self = Self {
        audio: true,
        video: false,
    };
    pub const VIDEO_ONLY: Self = Self {
        audio: false,
        video: true,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    /// Initial acquisition finished (possibly degraded).
    Acquired {
        stream: LocalStream,
        notice: Option<String>,
    },
    /// A track ended outside our control, e.g. the platform's
    /// "stop sharing" button.
    TrackEnded { track_id: String },
}

/// Camera, microphone and screen capture.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn get_user_media(&self, constraints: MediaConstraints)
    -> Result<LocalStream, MediaError>;

    /// `events` receives `TrackEnded` when the capture is stopped natively.
    async fn get_display_media(
        &self,
        events: mpsc::Sender<MediaEvent>,
    ) -> Result<LocalStream, MediaError>;

    /// Stopping a track on purpose never reports `TrackEnded`.
    async fn stop_track(&self, track: &MediaTrack);
}
