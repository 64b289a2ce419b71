//! Unified error handling for roomwire.
//!
//! Validation failures, server-reported errors, and transport failures all
//! flow to the caller through the session event stream as [`SessionError`]
//! values. Malformed inbound frames never appear here; they are logged and
//! dropped at the transport boundary.

use thiserror::Error;

use crate::policy::Rejection;

/// Errors surfaced through the session event stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Outbound text failed local validation; nothing reached the wire.
    #[error(transparent)]
    Validation(#[from] Rejection),

    /// The server sent an `error` frame. Connection state is unchanged.
    #[error("server error: {message}")]
    Protocol {
        /// Error text as reported by the server.
        message: String,
    },

    /// The socket failed or closed uncleanly.
    #[error("transport failure: {message}")]
    Transport {
        /// Underlying transport error text.
        message: String,
    },
}

impl SessionError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(Rejection::TooLong { .. }) => "message_too_long",
            Self::Validation(Rejection::Offensive) => "offensive_language",
            Self::Validation(Rejection::Empty) => "empty_message",
            Self::Protocol { .. } => "protocol_error",
            Self::Transport { .. } => "transport_failure",
        }
    }

    /// Whether the error was produced locally, before any frame was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
