//! Recorder container/codec negotiation

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Container used when the runtime accepts none of the preferred types
pub const DEFAULT_CONTAINER: &str = "video/webm";

/// Candidate MIME types in order of preference, with whether audio is kept
pub const CODEC_PREFERENCES: [(&str, bool); 6] = [
    ("video/webm;codecs=vp9,opus", true),
    ("video/webm;codecs=h264,opus", true),
    ("video/webm;codecs=vp8,opus", true),
    ("video/webm;codecs=vp9", false),
    ("video/webm;codecs=vp8", false),
    ("video/webm", false),
];

/// Target bitrates for a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitratePlan {
    /// Video bits per second
    pub video: u32,
    /// Audio bits per second
    pub audio: u32,
}

/// Options the recorder is created with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecorderProfile {
    /// Negotiated MIME type; `None` lets the runtime choose
    pub mime_type: Option<String>,
    /// Video bits per second
    pub video_bits_per_second: u32,
    /// Audio bits per second, `None` for video-only profiles
    pub audio_bits_per_second: Option<u32>,
}

impl RecorderProfile {
    /// Pick the first preferred MIME type the runtime supports
    pub fn negotiate<F>(plan: BitratePlan, is_supported: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        for (mime, with_audio) in CODEC_PREFERENCES {
            if is_supported(mime) {
                info!(
                    "Recording as {} at {:.1} Mbps",
                    mime,
                    f64::from(plan.video) / 1_000_000.0
                );
                return Self {
                    mime_type: Some(mime.to_string()),
                    video_bits_per_second: plan.video,
                    audio_bits_per_second: with_audio.then_some(plan.audio),
                };
            }
        }

        warn!(
            "No preferred recording format supported, using runtime default at {:.1} Mbps",
            f64::from(plan.video) / 1_000_000.0
        );
        Self {
            mime_type: None,
            video_bits_per_second: plan.video,
            audio_bits_per_second: Some(plan.audio),
        }
    }

    /// MIME type of the produced file
    pub fn container_mime(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(DEFAULT_CONTAINER)
    }

    /// File extension for the produced file
    pub fn file_extension(&self) -> &'static str {
        extension_for(self.mime_type.as_deref())
    }
}

/// `mp4` for MP4 MIME types, `webm` otherwise
pub fn extension_for(mime: Option<&str>) -> &'static str {
    match mime {
        Some(mime) if mime.contains("mp4") => "mp4",
        _ => "webm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: BitratePlan = BitratePlan {
        video: 8_000_000,
        audio: 192_000,
    };

    #[test]
    fn test_first_supported_wins() {
        let profile = RecorderProfile::negotiate(PLAN, |mime| mime.contains("vp8"));
        assert_eq!(profile.mime_type.as_deref(), Some("video/webm;codecs=vp8,opus"));
        assert_eq!(profile.audio_bits_per_second, Some(192_000));
    }

    #[test]
    fn test_video_only_profile_drops_audio_bitrate() {
        let profile = RecorderProfile::negotiate(PLAN, |mime| mime == "video/webm;codecs=vp9");
        assert_eq!(profile.audio_bits_per_second, None);
        assert_eq!(profile.video_bits_per_second, 8_000_000);
    }

    #[test]
    fn test_nothing_supported_falls_back() {
        let profile = RecorderProfile::negotiate(PLAN, |_| false);
        assert_eq!(profile.mime_type, None);
        assert_eq!(profile.container_mime(), DEFAULT_CONTAINER);
        assert_eq!(profile.file_extension(), "webm");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension_for(Some("video/mp4;codecs=avc1")), "mp4");
        assert_eq!(extension_for(Some("video/webm")), "webm");
    }
}
