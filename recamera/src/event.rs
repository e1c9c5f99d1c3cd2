//! Event system for player and session events

use std::time::Duration;

use recamera_media::RecorderProfile;
use recamera_signaling::StreamSource;
use tokio::sync::mpsc;

use crate::session::SessionState;

/// Events emitted by a [`crate::LivePlayer`]
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The WebRTC session changed state
    StateChanged {
        /// New state
        state: SessionState,
    },
    /// The watched stream changed
    StreamSwitched {
        /// Previous stream
        from: StreamSource,
        /// New stream
        to: StreamSource,
    },
    /// Playback was muted or unmuted
    MuteChanged {
        /// Whether audio is now muted
        muted: bool,
    },
    /// Fullscreen was entered or left
    FullscreenChanged {
        /// Whether the player is now fullscreen
        active: bool,
    },
    /// A recording started
    RecordingStarted {
        /// Negotiated recorder settings
        profile: RecorderProfile,
    },
    /// Once per second while recording
    RecordingTick {
        /// Elapsed time formatted `HH:MM:SS`
        elapsed: String,
    },
    /// A recording was written out
    RecordingSaved {
        /// File name
        file_name: String,
        /// File size in bytes
        bytes: usize,
        /// Wall time spent recording
        duration: Duration,
    },
    /// A recording ended without producing a file
    RecordingFailed {
        /// What went wrong
        reason: String,
    },
    /// A snapshot was written out
    SnapshotSaved {
        /// File name
        file_name: String,
    },
    /// A snapshot could not be taken
    SnapshotFailed {
        /// What went wrong
        reason: String,
    },
}

impl PlayerEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::StateChanged { .. } => "state_changed",
            PlayerEvent::StreamSwitched { .. } => "stream_switched",
            PlayerEvent::MuteChanged { .. } => "mute_changed",
            PlayerEvent::FullscreenChanged { .. } => "fullscreen_changed",
            PlayerEvent::RecordingStarted { .. } => "recording_started",
            PlayerEvent::RecordingTick { .. } => "recording_tick",
            PlayerEvent::RecordingSaved { .. } => "recording_saved",
            PlayerEvent::RecordingFailed { .. } => "recording_failed",
            PlayerEvent::SnapshotSaved { .. } => "snapshot_saved",
            PlayerEvent::SnapshotFailed { .. } => "snapshot_failed",
        }
    }

    /// Check if this is a recording-related event
    pub fn is_recording_event(&self) -> bool {
        matches!(
            self,
            PlayerEvent::RecordingStarted { .. }
                | PlayerEvent::RecordingTick { .. }
                | PlayerEvent::RecordingSaved { .. }
                | PlayerEvent::RecordingFailed { .. }
        )
    }

    /// Check if this event reports a failure
    pub fn is_error_event(&self) -> bool {
        match self {
            PlayerEvent::StateChanged { state } => state.is_failed(),
            PlayerEvent::RecordingFailed { .. } | PlayerEvent::SnapshotFailed { .. } => true,
            _ => false,
        }
    }
}

/// Stream of player events
#[derive(Debug)]
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<PlayerEvent>,
}

impl EventStream {
    /// Create a new event stream with a receiver
    pub fn new(receiver: mpsc::UnboundedReceiver<PlayerEvent>) -> Self {
        Self { receiver }
    }

    /// A stream that never yields anything
    pub fn closed() -> Self {
        let (_, receiver) = mpsc::unbounded_channel();
        Self { receiver }
    }

    /// Get the next event from the stream
    pub async fn next(&mut self) -> Option<PlayerEvent> {
        self.receiver.recv().await
    }

    /// Try to get the next event without blocking
    pub fn try_next(&mut self) -> Result<Option<PlayerEvent>, mpsc::error::TryRecvError> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(mpsc::error::TryRecvError::Disconnected),
        }
    }

    /// Close the event stream
    pub fn close(&mut self) {
        self.receiver.close();
    }

    /// Check if the event stream is closed
    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }
}
