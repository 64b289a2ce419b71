//! Per-session chat log.

use chrono::{DateTime, Utc};

/// What a log entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A participant's chat message.
    Message,
    /// A locally generated notice (joins, departures).
    System,
}

/// One rendered line of room history.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    /// Monotonic per-session sequence number.
    pub seq: u64,
    /// Sender display name; `None` for system entries.
    pub origin: Option<String>,
    /// Entry text.
    pub text: String,
    /// Message or system notice.
    pub kind: EntryKind,
    /// Whether the local participant sent it.
    pub is_own: bool,
    /// Whether it arrived during backlog replay, before the room went live.
    pub is_backlog: bool,
    /// Local receive time.
    pub received_at: DateTime<Utc>,
}

/// Append-only message log for one connection epoch.
///
/// Clearing resets the entries but not the sequence counter; sequence
/// numbers stay monotonic across reconnects within a session.
#[derive(Debug, Default)]
pub struct ChatLog {
    entries: Vec<ChatEntry>,
    next_seq: u64,
}

impl ChatLog {
    /// Append a chat message, returning a copy of the stored entry.
    pub fn push_message(
        &mut self,
        origin: &str,
        text: &str,
        is_own: bool,
        is_backlog: bool,
    ) -> ChatEntry {
        self.push(Some(origin.to_string()), text, EntryKind::Message, is_own, is_backlog)
    }

    /// Append a system notice, returning a copy of the stored entry.
    pub fn push_system(&mut self, text: &str, is_backlog: bool) -> ChatEntry {
        self.push(None, text, EntryKind::System, false, is_backlog)
    }

    fn push(
        &mut self,
        origin: Option<String>,
        text: &str,
        kind: EntryKind,
        is_own: bool,
        is_backlog: bool,
    ) -> ChatEntry {
        let entry = ChatEntry {
            seq: self.next_seq,
            origin,
            text: text.to_string(),
            kind,
            is_own,
            is_backlog,
            received_at: Utc::now(),
        };
        self.next_seq += 1;
        self.entries.push(entry.clone());
        entry
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries in arrival order.
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
