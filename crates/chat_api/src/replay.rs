use serde::Deserialize;

use crate::events::ChatStreamEvent;

/// Single-shot response body for the non-streaming protocol variant.
///
/// The whole reply arrives as one JSON object; its `chunks` are adapted
/// into the same [`ChatStreamEvent`] sequence the SSE variant produces
/// and replayed by the client with a fixed inter-chunk delay.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayResponse {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub chunks: Vec<ReplayChunk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayChunk {
    #[serde(rename = "type")]
    pub kind: ReplayChunkKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub references: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplayChunkKind {
    Content,
    References,
    Error,
    Done,
}

impl ReplayResponse {
    /// Flatten the single-shot body into protocol events, in order.
    ///
    /// A top-level `error` short-circuits the chunk list; a top-level
    /// `session_id` is surfaced as a leading `info` event.
    pub fn into_events(self) -> Vec<ChatStreamEvent> {
        if let Some(error) = self
            .error
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            return vec![ChatStreamEvent::Error {
                content: error.to_string(),
            }];
        }

        let mut events = Vec::with_capacity(self.chunks.len() + 1);
        if self.session_id.is_some() {
            events.push(ChatStreamEvent::Info {
                session_id: self.session_id,
            });
        }

        for chunk in self.chunks {
            let event = match chunk.kind {
                ReplayChunkKind::Content => ChatStreamEvent::Chunk {
                    content: chunk.content,
                    references: chunk.references,
                },
                ReplayChunkKind::References => ChatStreamEvent::Chunk {
                    content: String::new(),
                    references: Some(chunk.references.unwrap_or_default()),
                },
                ReplayChunkKind::Error => ChatStreamEvent::Error {
                    content: chunk.content,
                },
                ReplayChunkKind::Done => ChatStreamEvent::Done,
            };
            let terminal = event.is_terminal();
            events.push(event);
            if terminal {
                break;
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::ReplayResponse;
    use crate::events::ChatStreamEvent;

    #[test]
    fn replay_body_flattens_to_protocol_events() {
        let body = r#"{
            "session_id": "s-7",
            "chunks": [
                {"type": "content", "content": "Hello"},
                {"type": "references", "references": ["https://a.example/"]},
                {"type": "done", "content": ""}
            ]
        }"#;
        let replay: ReplayResponse = serde_json::from_str(body).expect("body should decode");

        assert_eq!(
            replay.into_events(),
            vec![
                ChatStreamEvent::Info {
                    session_id: Some("s-7".to_string()),
                },
                ChatStreamEvent::Chunk {
                    content: "Hello".to_string(),
                    references: None,
                },
                ChatStreamEvent::Chunk {
                    content: String::new(),
                    references: Some(vec!["https://a.example/".to_string()]),
                },
                ChatStreamEvent::Done,
            ]
        );
    }

    #[test]
    fn top_level_error_short_circuits_chunks() {
        let body = r#"{
            "error": "model overloaded",
            "chunks": [{"type": "content", "content": "partial"}]
        }"#;
        let replay: ReplayResponse = serde_json::from_str(body).expect("body should decode");

        assert_eq!(
            replay.into_events(),
            vec![ChatStreamEvent::Error {
                content: "model overloaded".to_string(),
            }]
        );
    }

    #[test]
    fn chunks_after_a_terminal_event_are_dropped() {
        let body = r#"{
            "chunks": [
                {"type": "error", "content": "boom"},
                {"type": "content", "content": "late"}
            ]
        }"#;
        let replay: ReplayResponse = serde_json::from_str(body).expect("body should decode");

        assert_eq!(
            replay.into_events(),
            vec![ChatStreamEvent::Error {
                content: "boom".to_string(),
            }]
        );
    }
}
