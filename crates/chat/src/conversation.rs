//! Conversation state: the ordered message log plus the transient
//! per-turn markers.

use sitechat_relay::Message;

/// Transient placeholder shown while a turn is retrieving context.
///
/// A UI-only marker: it is never part of the log and is removed before any
/// real message is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Display text for the pending slot
    pub label: String,
}

impl Default for Placeholder {
    fn default() -> Self {
        Self {
            label: "…".to_string(),
        }
    }
}

/// One chat session's state.
///
/// Lives for the session only; nothing is persisted. Invariants:
/// - at most one `pending` marker exists, and never inside `log`;
/// - `partial` only grows until it is committed into `log` or discarded.
#[derive(Debug, Default)]
pub struct Conversation {
    pub(crate) log: Vec<Message>,
    pub(crate) pending: Option<Placeholder>,
    pub(crate) partial: Option<String>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed message log, in order.
    pub fn log(&self) -> &[Message] {
        &self.log
    }

    /// The pending placeholder, if a turn is in flight.
    pub fn pending(&self) -> Option<&Placeholder> {
        self.pending.as_ref()
    }

    /// The in-flight streamed text, if a turn is streaming.
    pub fn partial(&self) -> Option<&str> {
        self.partial.as_deref()
    }
}
