//! # roomwire
//!
//! Client-side session manager for real-time chat rooms. A session owns
//! exactly one WebSocket connection, drives it through the
//! connect/identify/backlog-replay/ready protocol, maintains a live roster
//! of participants, enforces outbound message policy, and recovers from
//! unexpected disconnection with a single fixed-delay reconnect attempt.
//!
//! ## Quick start
//!
//! ```no_run
//! use roomwire::{Config, RoomId, Session, SessionEvent};
//!
//! #[tokio::main]
//! async fn main() {
//!     let room = RoomId::normalize("general");
//!     let (session, mut events) = Session::spawn(Config::default(), "alice", room);
//!
//!     session.send("hello");
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             SessionEvent::Entry(entry) => println!("{}", entry.text),
//!             SessionEvent::Error(error) => eprintln!("{error}"),
//!             _ => {}
//!         }
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod policy;
pub mod reconnect;
pub mod roster;
pub mod session;
pub mod transport;

pub use roomwire_proto as proto;

pub use crate::config::{Config, ConfigError};
pub use crate::error::SessionError;
pub use crate::policy::{MessagePolicy, Rejection, default_blocked_terms};
pub use crate::roster::Roster;
pub use crate::session::{ChatEntry, EntryKind, Session, SessionEvent, SessionState};
pub use crate::transport::{TransportEvent, TransportHandle};
pub use roomwire_proto::{ClientFrame, FrameError, RoomId, RoomKind, ServerFrame};
