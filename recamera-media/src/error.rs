//! Media error types and handling
//!
//! Errors raised while negotiating the peer connection, recording the live
//! stream or capturing a snapshot.

use thiserror::Error;

/// Main error type for media operations
#[derive(Error, Debug)]
pub enum MediaError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        /// Underlying error
        #[from]
        source: std::io::Error,
    },

    /// No live stream is attached
    #[error("No active media stream")]
    NoActiveStream,

    /// The stream carries no video track
    #[error("Media stream has no video track")]
    NoVideoTrack,

    /// A recording is already running
    #[error("A recording is already in progress")]
    AlreadyRecording,

    /// The runtime cannot create a recorder
    #[error("Media recorder unavailable: {reason}")]
    RecorderUnavailable {
        /// Failure reason
        reason: String,
    },

    /// The recorder reported a runtime error
    #[error("Media recorder failed: {reason}")]
    RecorderFailed {
        /// Failure reason
        reason: String,
    },

    /// Stopping produced no data
    #[error("Recording is empty ({chunks} chunks captured)")]
    EmptyRecording {
        /// Number of chunks captured
        chunks: usize,
    },

    /// No decoded frame to capture
    #[error("No video frame available: {reason}")]
    FrameUnavailable {
        /// Failure reason
        reason: String,
    },

    /// Encoding operation failed
    #[error("Encoding failed: {format} - {reason}")]
    Encoding {
        /// Output format
        format: String,
        /// Failure reason
        reason: String,
    },

    /// Offer/answer or candidate handling failed inside the peer connection
    #[error("Negotiation failed: {reason}")]
    Negotiation {
        /// Failure reason
        reason: String,
    },
}

/// Result type alias for media operations
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Check if the caller can retry the same operation later
    pub fn is_recoverable(&self) -> bool {
        match self {
            MediaError::Io { .. } => true,
            MediaError::NoActiveStream => true,
            MediaError::AlreadyRecording => true,
            MediaError::FrameUnavailable { .. } => true,
            MediaError::EmptyRecording { .. } => true,
            MediaError::RecorderFailed { .. } => true,
            MediaError::NoVideoTrack => false,
            MediaError::RecorderUnavailable { .. } => false,
            MediaError::Encoding { .. } => false,
            MediaError::Negotiation { .. } => false,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            MediaError::Io { .. } => ErrorCategory::System,
            MediaError::NoActiveStream => ErrorCategory::State,
            MediaError::NoVideoTrack => ErrorCategory::Video,
            MediaError::AlreadyRecording => ErrorCategory::State,
            MediaError::RecorderUnavailable { .. } => ErrorCategory::Platform,
            MediaError::RecorderFailed { .. } => ErrorCategory::Codec,
            MediaError::EmptyRecording { .. } => ErrorCategory::Data,
            MediaError::FrameUnavailable { .. } => ErrorCategory::Video,
            MediaError::Encoding { .. } => ErrorCategory::Codec,
            MediaError::Negotiation { .. } => ErrorCategory::Network,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// System-level errors (I/O, permissions, etc.)
    System,
    /// Codec-related errors
    Codec,
    /// Platform capability errors
    Platform,
    /// Data validation errors
    Data,
    /// State management errors
    State,
    /// Video-specific errors
    Video,
    /// Network-related errors
    Network,
}
