use serde::{Deserialize, Serialize};

/// One decoded unit of the chat wire protocol, in arrival order.
///
/// A stream carries any number of `info`/`chunk` events followed by
/// exactly one terminal event (`error` or `done`); the client stops
/// reading after either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatStreamEvent {
    /// Server-side session assignment, subject to first-assignment-wins.
    Info {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
    /// One text delta, optionally carrying a replacement reference list.
    Chunk {
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        references: Option<Vec<String>>,
    },
    /// Terminal failure; the stream must be treated as failed.
    Error { content: String },
    /// Terminal success.
    Done,
}

impl ChatStreamEvent {
    /// Returns true when no further frames follow this event.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::Done)
    }
}
