//! Configuration types and defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use recamera_core::{AnimationLoop, ConsoleError, OsdClock};
use recamera_media::peer::DEFAULT_STUN_SERVERS;
use recamera_media::{IceServer, PeerConfig, QualityTier};
use recamera_signaling::{SignalingEndpoint, StreamSource, DEFAULT_SIGNALING_PATH};
use serde::{Deserialize, Serialize};

/// Console configuration
///
/// Every field has a default, so a JSON file only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Device host and optional port
    pub host: String,
    /// Use a secure socket to reach the gateway
    pub secure: bool,
    /// Gateway path on the device
    pub signaling_path: String,
    /// Stream watched after connecting
    pub default_stream: StreamSource,
    /// ICE servers handed to the peer connection
    pub ice_servers: Vec<IceServer>,
    /// Interval at which the recorder hands over data, in milliseconds
    pub recorder_timeslice_ms: u64,
    /// Recording quality used until the user picks another
    pub default_quality: QualityTier,
    /// Directory recordings and snapshots are written to
    pub download_dir: PathBuf,
    /// Log filter used when `RUST_LOG` is not set
    pub log_filter: String,
    /// OSD clock refresh interval, in milliseconds
    pub osd_clock_interval_ms: u64,
    /// Canvas redraw interval, in milliseconds
    pub redraw_interval_ms: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            host: "192.168.42.1".to_string(),
            secure: false,
            signaling_path: DEFAULT_SIGNALING_PATH.to_string(),
            default_stream: StreamSource::Main,
            ice_servers: vec![IceServer {
                urls: DEFAULT_STUN_SERVERS.iter().map(|s| s.to_string()).collect(),
            }],
            recorder_timeslice_ms: 1000,
            default_quality: QualityTier::High,
            download_dir: PathBuf::from("."),
            log_filter: "recamera=info".to_string(),
            osd_clock_interval_ms: 1000,
            redraw_interval_ms: 16,
        }
    }
}

impl ConsoleConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(text: &str) -> Result<Self, ConsoleError> {
        serde_json::from_str(text).map_err(|e| ConsoleError::Configuration {
            reason: format!("invalid configuration: {}", e),
        })
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConsoleError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Signaling endpoint on the configured device
    pub fn endpoint(&self) -> SignalingEndpoint {
        SignalingEndpoint::new(self.host.clone(), self.secure).with_path(self.signaling_path.clone())
    }

    /// Peer connection configuration with the configured ICE servers
    pub fn peer_config(&self) -> PeerConfig {
        PeerConfig {
            ice_servers: self.ice_servers.clone(),
            ..PeerConfig::default()
        }
    }

    /// Recorder data interval
    pub fn recorder_timeslice(&self) -> Duration {
        Duration::from_millis(self.recorder_timeslice_ms)
    }

    /// OSD clock refresh interval
    pub fn osd_clock_interval(&self) -> Duration {
        Duration::from_millis(self.osd_clock_interval_ms)
    }

    /// Canvas redraw interval
    pub fn redraw_interval(&self) -> Duration {
        Duration::from_millis(self.redraw_interval_ms)
    }

    /// Start the clock driving the date/time overlay
    pub fn osd_clock(&self) -> OsdClock {
        OsdClock::start(self.osd_clock_interval())
    }

    /// Start a redraw loop at the configured interval
    pub fn redraw_loop<F>(&self, frame: F) -> AnimationLoop
    where
        F: FnMut() + Send + 'static,
    {
        AnimationLoop::start(self.redraw_interval(), frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::default();
        assert_eq!(config.signaling_path, "/go2rtc/api/ws");
        assert_eq!(config.default_stream, StreamSource::Main);
        assert_eq!(config.recorder_timeslice(), Duration::from_secs(1));
        assert_eq!(config.ice_servers[0].urls.len(), 2);
        assert_eq!(config.peer_config(), PeerConfig::default());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ConsoleConfig::from_json_str(
            r#"{"host": "camera.local:8443", "secure": true, "default_stream": "sub", "default_quality": "low"}"#,
        )
        .unwrap();
        assert_eq!(config.default_stream, StreamSource::Sub);
        assert_eq!(config.default_quality, QualityTier::Low);
        assert_eq!(config.redraw_interval_ms, 16);
        assert_eq!(
            config.endpoint().url(StreamSource::Sub),
            "wss://camera.local:8443/go2rtc/api/ws?src=sub"
        );
    }

    #[test]
    fn test_invalid_json_is_configuration_error() {
        let err = ConsoleConfig::from_json_str("{\"secure\": \"yes\"}").unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }
}
