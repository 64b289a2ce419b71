//! Room session orchestration.
//!
//! A [`Session`] owns one logical presence in one room: it opens a
//! transport connection, drives the identify/backlog/ready protocol,
//! tracks the roster, validates outbound messages, and recovers from
//! unexpected disconnects. The caller renders from the [`SessionEvent`]
//! stream and steers with the handle's three operations: send, reconnect,
//! leave.

mod controller;
mod log;

pub use log::{ChatEntry, ChatLog, EntryKind};

use roomwire_proto::RoomId;
use std::fmt;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::error::SessionError;
use controller::Controller;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No live connection.
    Disconnected,
    /// Socket opening under a fresh epoch.
    Connecting,
    /// Identified; backlog replay in progress.
    AwaitingReady,
    /// Backlog complete; the room is live.
    Ready,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::AwaitingReady => "awaiting-ready",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Observable output of a session, delivered in handling order.
///
/// A `StateChanged(Connecting)` marks a fresh connection epoch: the chat
/// log and roster are empty at that point.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The lifecycle state changed.
    StateChanged(SessionState),
    /// A chat or system entry was appended to the log.
    Entry(ChatEntry),
    /// The roster changed; carries the full current name list.
    RosterChanged(Vec<String>),
    /// The caller-facing error sink.
    Error(SessionError),
}

#[derive(Debug)]
pub(crate) enum Command {
    Send(String),
    Reconnect,
    Leave,
}

/// Caller-side handle to a running session.
///
/// Dropping the handle tears the session down as if [`Session::leave`] had
/// been called.
#[derive(Debug)]
pub struct Session {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl Session {
    /// Spawn a session for `participant` in `room`.
    ///
    /// Returns the handle and the event stream the caller renders from.
    /// The connection attempt begins immediately.
    pub fn spawn(
        config: Config,
        participant: &str,
        room: RoomId,
    ) -> (Session, mpsc::UnboundedReceiver<SessionEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let controller = Controller::new(config, participant, room, event_tx);
        tokio::spawn(controller.run(cmd_rx));
        (Session { cmd_tx }, event_rx)
    }

    /// Queue an outbound chat message.
    ///
    /// The text is validated before it may reach the wire; rejections
    /// surface as [`SessionEvent::Error`].
    pub fn send(&self, text: &str) {
        let _ = self.cmd_tx.send(Command::Send(text.to_string()));
    }

    /// Force a fresh connection, discarding the chat log and roster.
    pub fn reconnect(&self) {
        let _ = self.cmd_tx.send(Command::Reconnect);
    }

    /// Leave the room and end the session.
    pub fn leave(&self) {
        let _ = self.cmd_tx.send(Command::Leave);
    }
}
