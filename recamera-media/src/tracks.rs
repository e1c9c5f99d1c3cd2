//! Track abstractions and media frame types

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

/// Kind of media carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// Audio samples
    Audio,
    /// Video frames
    Video,
}

impl TrackKind {
    /// Lowercase name as used in SDP
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Audio => "audio",
            TrackKind::Video => "video",
        }
    }
}

/// A single remote track
///
/// Clones share the same live flag, so stopping one stops them all.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    id: String,
    kind: TrackKind,
    live: Arc<AtomicBool>,
}

impl MediaTrack {
    /// Create a live track
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Track ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Track kind
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// Whether the track still delivers media
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// End the track
    pub fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            debug!("Stopped {} track {}", self.kind.as_str(), self.id);
        }
    }
}

/// The set of tracks received from the peer connection
///
/// Cheap to clone; all clones see the same tracks.
#[derive(Debug, Clone, Default)]
pub struct MediaStream {
    tracks: Arc<RwLock<Vec<MediaTrack>>>,
}

impl MediaStream {
    /// Create an empty stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a track as it arrives
    pub fn add_track(&self, track: MediaTrack) {
        self.tracks.write().push(track);
    }

    /// All tracks
    pub fn tracks(&self) -> Vec<MediaTrack> {
        self.tracks.read().clone()
    }

    /// Video tracks
    pub fn video_tracks(&self) -> Vec<MediaTrack> {
        self.tracks_of(TrackKind::Video)
    }

    /// Audio tracks
    pub fn audio_tracks(&self) -> Vec<MediaTrack> {
        self.tracks_of(TrackKind::Audio)
    }

    /// Whether at least one live video track is present
    pub fn has_video(&self) -> bool {
        self.tracks
            .read()
            .iter()
            .any(|t| t.kind() == TrackKind::Video && t.is_live())
    }

    /// Stop every track
    pub fn stop_all(&self) {
        for track in self.tracks.read().iter() {
            track.stop();
        }
    }

    fn tracks_of(&self, kind: TrackKind) -> Vec<MediaTrack> {
        self.tracks
            .read()
            .iter()
            .filter(|t| t.kind() == kind)
            .cloned()
            .collect()
    }
}

/// A decoded video frame in RGBA8 layout
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel data, four bytes per pixel
    pub data: Vec<u8>,
    /// Timestamp in milliseconds
    pub timestamp: u64,
}

impl VideoFrame {
    /// Byte length a frame of this size should have
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}
