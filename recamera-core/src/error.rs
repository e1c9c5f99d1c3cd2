//! Error types for the reCamera console

use thiserror::Error;

/// Main error type for console operations
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// Signaling socket could not be opened or closed unexpectedly
    #[error("Transport error: {reason}")]
    Transport {
        /// Reason for transport error
        reason: String,
    },

    /// Message sent on a socket that is not open
    #[error("Signaling socket is not connected")]
    NotConnected,

    /// Invalid message format
    #[error("Invalid message format: {message}, error: {source}")]
    InvalidMessage {
        /// Invalid message content
        message: String,
        /// Parsing error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Offer/answer/candidate exchange failed
    #[error("Negotiation failed: {reason}")]
    Negotiation {
        /// Reason for negotiation failure
        reason: String,
    },

    /// Invalid state error
    #[error("Invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Expected state
        expected: String,
        /// Actual state
        actual: String,
    },

    /// A user-supplied field was rejected before any request was sent
    #[error("Invalid value for {field}: {reason}")]
    InvalidField {
        /// Field name
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {reason}")]
    Configuration {
        /// Reason for configuration failure
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        /// Underlying error
        #[from]
        source: std::io::Error,
    },
}

impl ConsoleError {
    /// Get error code for programmatic handling
    pub fn error_code(&self) -> String {
        match self {
            ConsoleError::Transport { .. } => "TRANSPORT_ERROR".to_string(),
            ConsoleError::NotConnected => "NOT_CONNECTED".to_string(),
            ConsoleError::InvalidMessage { .. } => "INVALID_MESSAGE".to_string(),
            ConsoleError::Negotiation { .. } => "NEGOTIATION_FAILED".to_string(),
            ConsoleError::InvalidState { .. } => "INVALID_STATE".to_string(),
            ConsoleError::InvalidField { .. } => "INVALID_FIELD".to_string(),
            ConsoleError::Configuration { .. } => "CONFIGURATION_ERROR".to_string(),
            ConsoleError::Io { .. } => "IO_ERROR".to_string(),
        }
    }

    /// Shorthand for a field validation failure
    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        ConsoleError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
