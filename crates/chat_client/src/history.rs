use chat_api::{HistoryTurn, SessionRecord};

use crate::transcript::{now_rfc3339, Message, Sender};

/// Longest representative title before truncation.
const TITLE_MAX_CHARS: usize = 50;
const UNTITLED_SESSION: &str = "New Chat";
const MISSING_CONTENT: &str = "No content available";

/// Normalized summary of one stored session for list rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: String,
    pub title: String,
    pub last_active: Option<String>,
}

/// Narrow read-only contract over the external history collaborator.
pub trait HistoryStore {
    fn fetch_all_sessions(&self) -> Result<Vec<SessionRecord>, String>;
    fn fetch_session_messages(&self, session_id: &str) -> Result<Vec<HistoryTurn>, String>;
}

/// Normalize stored session records into renderable summaries,
/// dropping records without any usable identifier.
pub fn summarize_sessions(records: &[SessionRecord]) -> Vec<SessionSummary> {
    records
        .iter()
        .filter_map(|record| {
            let session_id = record.session_id()?.to_string();
            Some(SessionSummary {
                session_id,
                title: session_title(record),
                last_active: record.last_active().map(str::to_string),
            })
        })
        .collect()
}

/// Representative title for a stored session: the first non-empty
/// user/assistant content item, truncated to 50 characters with an
/// ellipsis appended when longer.
pub fn session_title(record: &SessionRecord) -> String {
    let first_content = record.chat_history.iter().find_map(|turn| match turn {
        HistoryTurn::RoleTagged { role, content, .. } => {
            let role = role.trim();
            if (role.eq_ignore_ascii_case("user") || role.eq_ignore_ascii_case("assistant"))
                && !content.trim().is_empty()
            {
                Some(content.trim())
            } else {
                None
            }
        }
        HistoryTurn::Paired {
            user_message,
            bot_response,
            ..
        } => {
            if !user_message.trim().is_empty() {
                Some(user_message.trim())
            } else if !bot_response.trim().is_empty() {
                Some(bot_response.trim())
            } else {
                None
            }
        }
    });

    match first_content {
        Some(content) => truncate_title(content),
        None => UNTITLED_SESSION.to_string(),
    }
}

fn truncate_title(content: &str) -> String {
    if content.chars().count() <= TITLE_MAX_CHARS {
        return content.to_string();
    }

    let truncated: String = content.chars().take(TITLE_MAX_CHARS).collect();
    format!("{truncated}...")
}

/// Adapt stored turns into transcript messages, independent of which
/// wire shape the backend produced them in.
pub fn turns_to_messages(turns: &[HistoryTurn]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(turns.len());

    for turn in turns {
        match turn {
            HistoryTurn::RoleTagged {
                role,
                content,
                timestamp,
            } => {
                let sender = if role.trim().eq_ignore_ascii_case("assistant") {
                    Sender::Assistant
                } else {
                    Sender::User
                };
                let message = Message {
                    sender,
                    text: displayable(content),
                    references: Vec::new(),
                    streaming: false,
                    timestamp: timestamp.clone().unwrap_or_else(now_rfc3339),
                };
                messages.push(message);
            }
            HistoryTurn::Paired {
                user_message,
                bot_response,
                timestamp,
            } => {
                let timestamp = timestamp.clone().unwrap_or_else(now_rfc3339);
                messages.push(Message::user(displayable(user_message), timestamp.clone()));
                messages.push(Message::assistant(displayable(bot_response), timestamp));
            }
        }
    }

    messages
}

fn displayable(content: &str) -> String {
    if content.trim().is_empty() {
        MISSING_CONTENT.to_string()
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chat_api::{HistoryTurn, SessionRecord};

    use super::{session_title, summarize_sessions, turns_to_messages};
    use crate::transcript::Sender;

    fn record(json: &str) -> SessionRecord {
        serde_json::from_str(json).expect("record should decode")
    }

    #[test]
    fn title_uses_first_non_empty_content() {
        let record = record(
            r#"{
                "session_id": "s-1",
                "chat_history": [
                    {"role": "system", "content": "ignored"},
                    {"role": "user", "content": "   "},
                    {"role": "user", "content": "What is Rust?"}
                ]
            }"#,
        );

        assert_eq!(session_title(&record), "What is Rust?");
    }

    #[test]
    fn title_supports_paired_turn_shape() {
        let record = record(
            r#"{
                "id": "legacy-1",
                "chat_history": [
                    {"user_message": "", "bot_response": "Here is an answer"}
                ]
            }"#,
        );

        assert_eq!(session_title(&record), "Here is an answer");
    }

    #[test]
    fn long_titles_are_truncated_with_ellipsis() {
        let long = "x".repeat(60);
        let record = record(&format!(
            r#"{{"session_id":"s-1","chat_history":[{{"role":"user","content":"{long}"}}]}}"#
        ));

        let title = session_title(&record);
        assert_eq!(title.chars().count(), 53);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn sessions_without_usable_content_fall_back_to_default_title() {
        let record = record(r#"{"session_id":"s-1","chat_history":[]}"#);
        assert_eq!(session_title(&record), "New Chat");
    }

    #[test]
    fn summaries_drop_records_without_identifiers() {
        let records = vec![
            record(r#"{"session_id":"s-1"}"#),
            record(r#"{"chat_history":[]}"#),
            record(r#"{"id":"legacy-2","last_interaction_time":"2026-01-02T00:00:00Z"}"#),
        ];

        let summaries = summarize_sessions(&records);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].session_id, "s-1");
        assert_eq!(summaries[1].session_id, "legacy-2");
        assert_eq!(
            summaries[1].last_active.as_deref(),
            Some("2026-01-02T00:00:00Z")
        );
    }

    #[test]
    fn role_tagged_turns_map_to_single_messages() {
        let turns = vec![
            HistoryTurn::RoleTagged {
                role: "user".to_string(),
                content: "Q".to_string(),
                timestamp: Some("2026-01-01T00:00:00Z".to_string()),
            },
            HistoryTurn::RoleTagged {
                role: "assistant".to_string(),
                content: "".to_string(),
                timestamp: None,
            },
        ];

        let messages = turns_to_messages(&turns);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].text, "Q");
        assert_eq!(messages[0].timestamp, "2026-01-01T00:00:00Z");
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert_eq!(messages[1].text, "No content available");
    }

    #[test]
    fn paired_turns_expand_to_user_then_assistant() {
        let turns = vec![HistoryTurn::Paired {
            user_message: "Q".to_string(),
            bot_response: "A".to_string(),
            timestamp: Some("2026-01-01T00:00:00Z".to_string()),
        }];

        let messages = turns_to_messages(&turns);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].text, "Q");
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert_eq!(messages[1].text, "A");
        assert_eq!(messages[1].timestamp, "2026-01-01T00:00:00Z");
    }
}
