//! Signaling socket addressing

use std::fmt;
use std::str::FromStr;

use recamera_core::ConsoleError;
use serde::{Deserialize, Serialize};

/// Default gateway path on the device
pub const DEFAULT_SIGNALING_PATH: &str = "/go2rtc/api/ws";

/// Which encoder output to watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamSource {
    /// Full resolution stream
    #[default]
    Main,
    /// Reduced resolution stream
    Sub,
}

impl StreamSource {
    /// Value of the `src` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamSource::Main => "main",
            StreamSource::Sub => "sub",
        }
    }
}

impl fmt::Display for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamSource {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(StreamSource::Main),
            "sub" => Ok(StreamSource::Sub),
            other => Err(ConsoleError::invalid_field("stream", format!("unknown source '{}'", other))),
        }
    }
}

/// Where the signaling socket lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalingEndpoint {
    /// Host and optional port of the device
    pub host: String,
    /// Use `wss` instead of `ws`
    pub secure: bool,
    /// Gateway path
    pub path: String,
}

impl SignalingEndpoint {
    /// Endpoint on `host` with the default gateway path
    pub fn new(host: impl Into<String>, secure: bool) -> Self {
        Self {
            host: host.into(),
            secure,
            path: DEFAULT_SIGNALING_PATH.to_string(),
        }
    }

    /// Use a different gateway path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Socket URL for the given stream
    pub fn url(&self, source: StreamSource) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        let path = self.path.trim_start_matches('/');
        format!("{}://{}/{}?src={}", scheme, self.host, path, source)
    }
}
