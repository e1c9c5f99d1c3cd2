//! Peer connection seam
//!
//! The session controller drives any WebRTC stack through these traits. A
//! concrete stack reports asynchronous happenings (local candidates, state
//! changes, remote tracks) on the [`PeerEvent`] channel it returns from
//! [`PeerConnectionFactory::create`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::MediaResult;
use crate::tracks::{MediaTrack, TrackKind};

/// Public STUN servers used when nothing else is configured
pub const DEFAULT_STUN_SERVERS: [&str; 2] = ["stun:stun.cloudflare.com:3478", "stun:stun.l.google.com:19302"];

/// Connection state as reported by the WebRTC stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    /// Not yet connecting
    New,
    /// ICE/DTLS in progress
    Connecting,
    /// Media is flowing
    Connected,
    /// Connectivity lost, may come back
    Disconnected,
    /// Connectivity lost for good
    Failed,
    /// Closed locally
    Closed,
}

impl PeerConnectionState {
    /// Whether the connection is lost and must be torn down
    pub fn is_lost(&self) -> bool {
        matches!(self, PeerConnectionState::Failed | PeerConnectionState::Disconnected)
    }
}

/// Direction of a transceiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransceiverDirection {
    /// Receive only
    RecvOnly,
    /// Send and receive
    SendRecv,
}

/// How media lines are bundled onto transports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundlePolicy {
    /// Gather per media type
    Balanced,
    /// One transport for everything
    #[default]
    MaxBundle,
}

/// One ICE server entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    /// Server URLs
    pub urls: Vec<String>,
}

/// Peer connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerConfig {
    /// ICE servers
    pub ice_servers: Vec<IceServer>,
    /// Bundle policy
    pub bundle_policy: BundlePolicy,
    /// SDP semantics, always unified plan for the gateway
    pub sdp_semantics: String,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServer {
                urls: DEFAULT_STUN_SERVERS.iter().map(|s| s.to_string()).collect(),
            }],
            bundle_policy: BundlePolicy::MaxBundle,
            sdp_semantics: "unified-plan".to_string(),
        }
    }
}

/// Asynchronous notifications from a peer connection
#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// A local ICE candidate was gathered
    IceCandidate(String),
    /// Candidate gathering finished
    IceGatheringComplete,
    /// Connection state changed
    StateChanged(PeerConnectionState),
    /// A remote track arrived
    Track(MediaTrack),
}

/// A single WebRTC peer connection
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Add a transceiver for `kind`
    fn add_transceiver(&self, kind: TrackKind, direction: TransceiverDirection) -> MediaResult<()>;

    /// Create an SDP offer
    async fn create_offer(&self) -> MediaResult<String>;

    /// Apply the local description
    async fn set_local_description(&self, sdp: &str) -> MediaResult<()>;

    /// Apply the remote answer
    async fn set_remote_answer(&self, sdp: &str) -> MediaResult<()>;

    /// Add a remote ICE candidate
    async fn add_ice_candidate(&self, candidate: &str, sdp_mid: &str) -> MediaResult<()>;

    /// Current connection state
    fn connection_state(&self) -> PeerConnectionState;

    /// Stop any tracks this side sends
    fn stop_senders(&self);

    /// Close the connection; idempotent
    fn close(&self);
}

/// Creates peer connections
pub trait PeerConnectionFactory: Send + Sync {
    /// Create a connection and the channel its events arrive on
    fn create(
        &self,
        config: &PeerConfig,
    ) -> MediaResult<(Arc<dyn PeerConnection>, mpsc::UnboundedReceiver<PeerEvent>)>;
}
