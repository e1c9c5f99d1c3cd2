//! Signaling protocol messages
//!
//! The media gateway speaks small JSON envelopes of the form
//! `{"type": "...", "value": ...}`. Only the WebRTC exchange is interpreted
//! here; anything else is kept verbatim as [`SignalingMessage::Other`].

use recamera_core::ConsoleError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message type for an SDP offer
pub const OFFER: &str = "webrtc/offer";
/// Message type for an SDP answer
pub const ANSWER: &str = "webrtc/answer";
/// Message type for an ICE candidate
pub const CANDIDATE: &str = "webrtc/candidate";
/// Message type for a gateway error
pub const ERROR: &str = "error";

/// Media line the gateway expects remote candidates to belong to
pub const DEFAULT_SDP_MID: &str = "0";

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: Value,
}

/// Control messages exchanged with the media gateway
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingMessage {
    /// SDP offer, client to gateway
    Offer {
        /// Session description
        sdp: String,
    },
    /// SDP answer, gateway to client
    Answer {
        /// Session description
        sdp: String,
    },
    /// ICE candidate, either direction
    Candidate {
        /// Candidate line
        candidate: String,
    },
    /// Error reported by the gateway
    Error {
        /// Error text
        message: String,
    },
    /// Any other message type
    Other {
        /// Value of the `type` field
        kind: String,
        /// Raw payload
        value: Value,
    },
}

impl SignalingMessage {
    /// Value of the `type` field
    pub fn kind(&self) -> &str {
        match self {
            SignalingMessage::Offer { .. } => OFFER,
            SignalingMessage::Answer { .. } => ANSWER,
            SignalingMessage::Candidate { .. } => CANDIDATE,
            SignalingMessage::Error { .. } => ERROR,
            SignalingMessage::Other { kind, .. } => kind,
        }
    }

    /// Parse a text frame
    pub fn from_json(text: &str) -> Result<Self, ConsoleError> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(|e| ConsoleError::InvalidMessage {
                message: text.to_string(),
                source: e.into(),
            })?;

        let as_text = |value: &Value| value.as_str().map(str::to_string);
        let message = match (envelope.kind.as_str(), as_text(&envelope.value)) {
            (OFFER, Some(sdp)) => SignalingMessage::Offer { sdp },
            (ANSWER, Some(sdp)) => SignalingMessage::Answer { sdp },
            (CANDIDATE, Some(candidate)) => SignalingMessage::Candidate { candidate },
            (ERROR, Some(message)) => SignalingMessage::Error { message },
            _ => SignalingMessage::Other {
                kind: envelope.kind,
                value: envelope.value,
            },
        };
        Ok(message)
    }

    /// Encode as a text frame
    pub fn to_json(&self) -> String {
        let value = match self {
            SignalingMessage::Offer { sdp } | SignalingMessage::Answer { sdp } => Value::from(sdp.as_str()),
            SignalingMessage::Candidate { candidate } => Value::from(candidate.as_str()),
            SignalingMessage::Error { message } => Value::from(message.as_str()),
            SignalingMessage::Other { value, .. } => value.clone(),
        };
        let envelope = Envelope {
            kind: self.kind().to_string(),
            value,
        };
        // An envelope of a string and a JSON value always serializes
        serde_json::to_string(&envelope).unwrap_or_default()
    }

    /// Whether this is a gateway error about the WebRTC exchange
    pub fn is_webrtc_error(&self) -> bool {
        matches!(self, SignalingMessage::Error { message } if message.contains("webrtc"))
    }
}
