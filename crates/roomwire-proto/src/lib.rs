//! # roomwire-proto
//!
//! Wire-level types for the roomwire chat room protocol: the JSON frames
//! exchanged over a room WebSocket, and the room identifier rules used to
//! build transport URLs.
//!
//! The protocol is one JSON object per text frame. Frames are field-keyed
//! rather than carrying an explicit tag, so this crate decodes them once at
//! the boundary into exhaustive enums; everything downstream matches on
//! typed variants instead of probing optional fields.
//!
//! ## Quick start
//!
//! ```rust
//! use roomwire_proto::{ClientFrame, RoomId, ServerFrame};
//!
//! let identify = ClientFrame::Identify { name: "alice".into() };
//! assert_eq!(identify.encode(), r#"{"name":"alice"}"#);
//!
//! let frame = ServerFrame::decode(r#"{"joined":"bob"}"#).unwrap();
//! assert_eq!(frame, ServerFrame::Joined { name: "bob".into() });
//!
//! let room = RoomId::normalize("My Room!");
//! assert_eq!(room.as_str(), "myroom");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod frame;
pub mod room;

pub use self::frame::{ClientFrame, FrameError, ServerFrame};
pub use self::room::{RoomId, RoomKind};
