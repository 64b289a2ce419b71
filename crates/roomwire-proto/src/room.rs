//! Room identifier normalization and transport URL construction.
//!
//! Two classes of identifier exist. A 64-hex-character token names a
//! private room and passes through verbatim; anything else is a public room
//! name, stripped to `[a-zA-Z0-9_-]` and lower-cased. Normalization is
//! idempotent: normalizing an already-normalized identifier is a no-op.

use std::fmt;

/// Classification of a room identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomKind {
    /// A 64-hex-character token, typically shared by link.
    Private,
    /// A human-chosen name, sanitized and lower-cased.
    Public,
}

/// A normalized room identifier, safe to place in a transport URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId {
    id: String,
    kind: RoomKind,
}

fn is_private_token(raw: &str) -> bool {
    raw.len() == 64 && raw.chars().all(|c| c.is_ascii_hexdigit())
}

impl RoomId {
    /// Normalize a caller-supplied room identifier.
    pub fn normalize(raw: &str) -> Self {
        if is_private_token(raw) {
            return Self { id: raw.to_string(), kind: RoomKind::Private };
        }
        let id: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect::<String>()
            .to_ascii_lowercase();
        Self { id, kind: RoomKind::Public }
    }

    /// The normalized identifier string.
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Whether this is a private (token-addressed) room.
    pub fn kind(&self) -> RoomKind {
        self.kind
    }

    /// Build the WebSocket endpoint URL for this room.
    pub fn url(&self, secure: bool, host: &str) -> String {
        let scheme = if secure { "wss" } else { "ws" };
        format!("{scheme}://{host}/api/room/{}/websocket", self.id)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn test_private_token_passes_through() {
        let room = RoomId::normalize(TOKEN);
        assert_eq!(room.as_str(), TOKEN);
        assert_eq!(room.kind(), RoomKind::Private);

        // Upper-case hex is still a private token and is kept verbatim.
        let upper = TOKEN.to_ascii_uppercase();
        let room = RoomId::normalize(&upper);
        assert_eq!(room.as_str(), upper);
        assert_eq!(room.kind(), RoomKind::Private);
    }

    #[test]
    fn test_public_name_sanitized() {
        let room = RoomId::normalize("My Room! #42");
        assert_eq!(room.as_str(), "myroom42");
        assert_eq!(room.kind(), RoomKind::Public);

        let room = RoomId::normalize("general_chat-2");
        assert_eq!(room.as_str(), "general_chat-2");
    }

    #[test]
    fn test_normalization_idempotent() {
        for raw in ["General Chat!", TOKEN, "a-b_c", "###"] {
            let once = RoomId::normalize(raw);
            let twice = RoomId::normalize(once.as_str());
            assert_eq!(once.as_str(), twice.as_str());
        }
    }

    #[test]
    fn test_sixty_five_hex_chars_is_public() {
        let raw = format!("{TOKEN}f");
        let room = RoomId::normalize(&raw);
        assert_eq!(room.kind(), RoomKind::Public);
        assert_eq!(room.as_str(), raw);
    }

    #[test]
    fn test_url_shape() {
        let room = RoomId::normalize("general");
        assert_eq!(
            room.url(false, "127.0.0.1:8787"),
            "ws://127.0.0.1:8787/api/room/general/websocket"
        );
        assert_eq!(
            room.url(true, "rooms.example.com"),
            "wss://rooms.example.com/api/room/general/websocket"
        );
    }
}
