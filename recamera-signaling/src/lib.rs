//! # reCamera Signaling
//!
//! Signaling socket to the camera's media gateway. Carries the WebRTC
//! offer/answer/candidate exchange as small JSON envelopes over a WebSocket.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod endpoint;
pub mod protocol;
pub mod transport;

// Re-export main types
pub use endpoint::{SignalingEndpoint, StreamSource, DEFAULT_SIGNALING_PATH};
pub use protocol::SignalingMessage;
pub use transport::{SignalingTransport, Subscription, TransportEvent, TransportState};
