//! # reCamera Media
//!
//! Media side of the live-view console: the peer connection seam, received
//! tracks, local recording with codec and bitrate negotiation, and PNG
//! snapshots of the decoded video.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod codecs;
pub mod error;
pub mod peer;
pub mod recording;
pub mod snapshot;
pub mod tracks;

// Re-export main types
pub use codecs::{BitratePlan, RecorderProfile, CODEC_PREFERENCES};
pub use error::{ErrorCategory, MediaError, MediaResult};
pub use peer::{
    BundlePolicy, IceServer, PeerConfig, PeerConnection, PeerConnectionFactory, PeerConnectionState,
    PeerEvent, TransceiverDirection,
};
pub use recording::{
    bitrate_plan, format_elapsed, MediaRecorder, MediaRecorderFactory, QualityTier, RecorderEvent,
    RecorderState, RecordingFile, RecordingPipeline,
};
pub use snapshot::{capture_snapshot, Snapshot, VideoSource};
pub use tracks::{MediaStream, MediaTrack, TrackKind, VideoFrame};
