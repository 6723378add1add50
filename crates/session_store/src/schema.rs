use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// Conversation identity for one client installation.
///
/// `session_id` starts unassigned; the server supplies it on the first
/// send. Once assigned it may only be replaced by an explicit chat
/// selection or cleared by an explicit new-chat reset; a later server
/// assignment never overwrites it (first-assignment-wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub user_id: String,
    pub session_id: Option<String>,
}

impl ChatSession {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: None,
        }
    }

    /// Adopt a server-assigned id only while currently unassigned.
    ///
    /// Returns true when the assignment was taken.
    pub fn adopt_assigned(&mut self, session_id: impl Into<String>) -> bool {
        if self.session_id.is_some() {
            return false;
        }

        let session_id = session_id.into();
        if session_id.trim().is_empty() {
            return false;
        }

        self.session_id = Some(session_id);
        true
    }

    /// Switch to an explicitly selected existing session.
    pub fn select(&mut self, session_id: impl Into<String>) {
        self.session_id = Some(session_id.into());
    }

    /// Explicit new-chat reset back to the unassigned state.
    pub fn clear_assignment(&mut self) {
        self.session_id = None;
    }
}

/// On-disk document wrapping the session record with a schema version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SessionDocument {
    pub version: u32,
    #[serde(flatten)]
    pub session: ChatSession,
}

impl SessionDocument {
    pub(crate) fn v1(session: ChatSession) -> Self {
        Self {
            version: SCHEMA_VERSION,
            session,
        }
    }
}
