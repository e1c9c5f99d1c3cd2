//! # reCamera - Live View Console Core
//!
//! The interactive part of the reCamera web console, as a library: the
//! WebRTC live view with stream switching, local recording and snapshots,
//! plus the privacy-mask and OSD overlay editors.
//!
//! ## Key Features
//!
//! - **WebRTC session**: offer/answer/candidate exchange over the camera's signaling socket
//! - **Recording**: codec negotiation, resolution-based bitrate policy, single-file export
//! - **Snapshots**: PNG capture of the decoded frame at native size
//! - **Mask and OSD editing**: resolution-independent geometry with copy-on-write updates
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use recamera::{ConsoleConfig, LivePlayer, PeerConnectionFactory, MediaRecorderFactory};
//!
//! # async fn example(
//! #     peers: Arc<dyn PeerConnectionFactory>,
//! #     recorders: Arc<dyn MediaRecorderFactory>,
//! # ) -> Result<(), recamera::PlayerError> {
//! let config = ConsoleConfig::from_json_file("console.json")?;
//! recamera::logging::init(&config.log_filter);
//!
//! let player = LivePlayer::builder(config, peers, recorders).build();
//! let mut events = player.events();
//! player.connect().await;
//!
//! while let Some(event) = events.next().await {
//!     println!("Player event: {:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use recamera_core::{
    Canvas2d, ConsoleError, ContainerRect, DateStyle, LiveView, Mask, MaskEditor, MaskList, MaskRenderer,
    MaskScene, OsdClock, OsdOverlay, OsdSettings, RelativeRect, ResizeWatcher, Size, StaticIpConfig, TimeStyle,
    MAX_MASKS,
};

pub use recamera_media::{
    MediaError, MediaRecorder, MediaRecorderFactory, MediaStream, MediaTrack, PeerConfig, PeerConnection,
    PeerConnectionFactory, PeerConnectionState, PeerEvent, QualityTier, RecorderProfile, RecordingFile, Snapshot,
    TrackKind, VideoFrame, VideoSource,
};

pub use recamera_signaling::{SignalingEndpoint, SignalingMessage, SignalingTransport, StreamSource};

// Public API modules
pub mod config;
pub mod download;
pub mod error;
pub mod event;
pub mod fullscreen;
pub mod logging;
pub mod notify;
pub mod playback;
pub mod player;
pub mod session;

// Re-export main API types
pub use config::ConsoleConfig;
pub use download::{DirectoryDownloadSink, DownloadSink};
pub use error::PlayerError;
pub use event::{EventStream, PlayerEvent};
pub use fullscreen::{is_fullscreen_shortcut, toggle_fullscreen, FullscreenControl, KeyPress};
pub use notify::{LogNotifier, Notifier};
pub use playback::Playback;
pub use player::{LivePlayer, LivePlayerBuilder};
pub use session::{SessionState, WebRtcSession};
