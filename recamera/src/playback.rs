//! Video element seam

use recamera_media::MediaStream;

/// The element that plays the received stream
pub trait Playback: Send + Sync {
    /// Show `stream`, or nothing
    fn attach(&self, stream: Option<&MediaStream>);

    /// Start playback; fails when the platform blocks autoplay
    fn play(&self, muted: bool) -> Result<(), String>;

    /// Mute or unmute audio
    fn set_muted(&self, muted: bool);
}
