use serde::Deserialize;

/// Envelope returned by the all-sessions history endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub histories: Vec<SessionRecord>,
}

/// One stored session summary, tolerant of the backend's divergent key
/// naming (`id` vs `session_id`, `created_at` vs `start_time`).
#[derive(Debug, Clone, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub chat_history: Vec<HistoryTurn>,
    #[serde(default)]
    pub last_interaction_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
}

impl SessionRecord {
    /// Canonical session identifier, whichever key the backend used.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id
            .as_deref()
            .or(self.id.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Most recent activity timestamp, falling back to creation time.
    #[must_use]
    pub fn last_active(&self) -> Option<&str> {
        self.last_interaction_time
            .as_deref()
            .or(self.created_at.as_deref())
            .or(self.start_time.as_deref())
    }
}

/// One stored conversation turn, in either wire shape the backend emits:
/// a role-tagged message or a paired `user_message`/`bot_response` row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum HistoryTurn {
    RoleTagged {
        role: String,
        content: String,
        #[serde(default)]
        timestamp: Option<String>,
    },
    Paired {
        user_message: String,
        bot_response: String,
        #[serde(default)]
        timestamp: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::{HistoryTurn, SessionRecord};

    #[test]
    fn session_record_accepts_either_identifier_key() {
        let by_session_id: SessionRecord =
            serde_json::from_str(r#"{"session_id":"s-1"}"#).expect("record should decode");
        assert_eq!(by_session_id.session_id(), Some("s-1"));

        let by_id: SessionRecord =
            serde_json::from_str(r#"{"id":"legacy-2"}"#).expect("record should decode");
        assert_eq!(by_id.session_id(), Some("legacy-2"));

        let preferring_session_id: SessionRecord =
            serde_json::from_str(r#"{"id":"legacy","session_id":"s-3"}"#)
                .expect("record should decode");
        assert_eq!(preferring_session_id.session_id(), Some("s-3"));
    }

    #[test]
    fn last_active_falls_back_through_timestamp_keys() {
        let record: SessionRecord = serde_json::from_str(
            r#"{"session_id":"s-1","start_time":"2024-01-01T00:00:00Z"}"#,
        )
        .expect("record should decode");
        assert_eq!(record.last_active(), Some("2024-01-01T00:00:00Z"));

        let record: SessionRecord = serde_json::from_str(
            r#"{"session_id":"s-1","last_interaction_time":"2024-02-02T00:00:00Z","created_at":"2024-01-01T00:00:00Z"}"#,
        )
        .expect("record should decode");
        assert_eq!(record.last_active(), Some("2024-02-02T00:00:00Z"));
    }

    #[test]
    fn history_turns_decode_both_wire_shapes() {
        let role_tagged: HistoryTurn = serde_json::from_str(
            r#"{"role":"assistant","content":"Hi","timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .expect("turn should decode");
        assert_eq!(
            role_tagged,
            HistoryTurn::RoleTagged {
                role: "assistant".to_string(),
                content: "Hi".to_string(),
                timestamp: Some("2024-01-01T00:00:00Z".to_string()),
            }
        );

        let paired: HistoryTurn =
            serde_json::from_str(r#"{"user_message":"Q","bot_response":"A"}"#)
                .expect("turn should decode");
        assert_eq!(
            paired,
            HistoryTurn::Paired {
                user_message: "Q".to_string(),
                bot_response: "A".to_string(),
                timestamp: None,
            }
        );
    }
}
