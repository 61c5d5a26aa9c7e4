use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackSource {
    Microphone,
    Camera,
    Screen,
}

impl TrackSource {
    pub fn kind(self) -> TrackKind {
        match self {
            Self::Microphone => TrackKind::Audio,
            Self::Camera | Self::Screen => TrackKind::Video,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTrack {
    pub id: String,
    pub source: TrackSource,
    pub label: String,
    pub enabled: bool,
}

impl MediaTrack {
    pub fn new(source: TrackSource, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source,
            label: label.into(),
            enabled: true,
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.source.kind()
    }
}

/// An immutable set of local tracks.
///
/// Every media change produces a new value; holders of an older value keep
/// seeing the tracks they were handed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStream {
    id: String,
    tracks: Arc<[MediaTrack]>,
}

impl LocalStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tracks: tracks.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn track(&self, kind: TrackKind) -> Option<&MediaTrack> {
        self.tracks.iter().find(|t| t.kind() == kind)
    }

    pub fn audio_track(&self) -> Option<&MediaTrack> {
        self.track(TrackKind::Audio)
    }

    pub fn video_track(&self) -> Option<&MediaTrack> {
        self.track(TrackKind::Video)
    }

    pub fn with_audio_enabled(&self, enabled: bool) -> Self {
        let tracks = self
            .tracks
            .iter()
            .cloned()
            .map(|mut t| {
                if t.kind() == TrackKind::Audio {
                    t.enabled = enabled;
                }
                t
            })
            .collect();
        Self::new(tracks)
    }

    /// Replaces any track of the same kind.
    pub fn with_track(&self, track: MediaTrack) -> Self {
        let mut tracks: Vec<_> = self
            .tracks
            .iter()
            .filter(|t| t.kind() != track.kind())
            .cloned()
            .collect();
        tracks.push(track);
        Self::new(tracks)
    }

    pub fn without(&self, kind: TrackKind) -> Self {
        Self::new(
            self.tracks
                .iter()
                .filter(|t| t.kind() != kind)
                .cloned()
                .collect(),
        )
    }
}
