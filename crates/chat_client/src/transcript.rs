use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Greeting shown at the start of every fresh conversation.
pub const GREETING: &str = "Hello! How can I assist you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

/// One transcript entry.
///
/// `text` holds render-ready markup for assistant messages (citation
/// markers already rewritten into links) and raw input for user
/// messages. At most one message is `streaming` at any time (the
/// latest assistant message) and a message never changes once its
/// streaming flag drops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    #[serde(default)]
    pub streaming: bool,
    pub timestamp: String,
}

impl Message {
    #[must_use]
    pub fn user(text: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            references: Vec::new(),
            streaming: false,
            timestamp: timestamp.into(),
        }
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
            references: Vec::new(),
            streaming: false,
            timestamp: timestamp.into(),
        }
    }

    #[must_use]
    pub fn greeting(timestamp: impl Into<String>) -> Self {
        Self::assistant(GREETING, timestamp)
    }
}

/// Current UTC time as an RFC 3339 string.
#[must_use]
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
