//! Client and server frames for the room WebSocket protocol.
//!
//! Inbound frames are identified by which field they carry: `{"joined":..}`
//! is a join notice, `{"quit":..}` a departure, and so on. Decoding happens
//! exactly once here; callers receive a [`ServerFrame`] and match
//! exhaustively.

use serde::Deserialize;
use thiserror::Error;

/// Errors produced while decoding an inbound frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The payload was not valid JSON, or matched no known frame shape.
    #[error("invalid frame: {0}")]
    Invalid(#[from] serde_json::Error),
    /// The payload parsed but carried an unusable value.
    #[error("unrecognized frame payload")]
    Unrecognized,
}

/// Frames sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    /// Identification, sent once immediately after the socket opens.
    Identify {
        /// Display name of the local participant.
        name: String,
    },
    /// A chat message to broadcast to the room.
    Chat {
        /// Validated message text.
        message: String,
    },
    /// Heartbeat keep-alive.
    Ping,
}

impl ClientFrame {
    /// Encode to the single-object JSON wire form.
    pub fn encode(&self) -> String {
        let value = match self {
            Self::Identify { name } => serde_json::json!({ "name": name }),
            Self::Chat { message } => serde_json::json!({ "message": message }),
            Self::Ping => serde_json::json!({ "type": "ping" }),
        };
        value.to_string()
    }
}

/// Frames received from the server, one per inbound text payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    /// A chat broadcast, either live or part of the backlog replay.
    Chat {
        /// Display name of the sender.
        name: String,
        /// Message text.
        message: String,
    },
    /// A participant joined the room.
    Joined {
        /// Display name of the participant.
        name: String,
    },
    /// A participant left the room.
    Quit {
        /// Display name of the participant.
        name: String,
    },
    /// A server-side error report; does not change connection state.
    Error {
        /// Human-readable error text.
        message: String,
    },
    /// End of backlog replay; the room is live from here on.
    Ready,
}

/// Raw deserialization target. The wire frames are distinguished by field
/// presence, so each variant is tried in order; a chat broadcast carries
/// both `message` and `name` and must come first.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFrame {
    Chat { message: String, name: String },
    Joined { joined: String },
    Quit { quit: String },
    Error { error: String },
    Ready { ready: bool },
}

impl ServerFrame {
    /// Decode one inbound text payload.
    pub fn decode(raw: &str) -> Result<Self, FrameError> {
        match serde_json::from_str::<RawFrame>(raw)? {
            RawFrame::Chat { message, name } => Ok(Self::Chat { name, message }),
            RawFrame::Joined { joined } => Ok(Self::Joined { name: joined }),
            RawFrame::Quit { quit } => Ok(Self::Quit { name: quit }),
            RawFrame::Error { error } => Ok(Self::Error { message: error }),
            RawFrame::Ready { ready: true } => Ok(Self::Ready),
            RawFrame::Ready { ready: false } => Err(FrameError::Unrecognized),
        }
    }
}
