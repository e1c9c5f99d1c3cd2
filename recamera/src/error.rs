//! Error type for the player facade

use recamera_core::ConsoleError;
use recamera_media::MediaError;
use thiserror::Error;

/// Errors returned by [`crate::LivePlayer`] operations
#[derive(Error, Debug)]
pub enum PlayerError {
    /// Signaling, configuration or validation failure
    #[error(transparent)]
    Console(#[from] ConsoleError),

    /// Recording, snapshot or peer connection failure
    #[error(transparent)]
    Media(#[from] MediaError),
}

impl PlayerError {
    /// Get error code for programmatic handling
    pub fn error_code(&self) -> String {
        match self {
            PlayerError::Console(e) => e.error_code(),
            PlayerError::Media(e) => format!("MEDIA_{:?}", e.category()).to_uppercase(),
        }
    }
}
