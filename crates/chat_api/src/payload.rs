use serde::{Deserialize, Serialize};

/// Canonical request payload for the chat send endpoint.
///
/// `session_id` is serialized as `null` while the server has not yet
/// assigned one; the server answers with an `info` event carrying the
/// assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn new(
        user_id: impl Into<String>,
        message: impl Into<String>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
            session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ChatRequest;

    #[test]
    fn unassigned_session_serializes_as_null() {
        let request = ChatRequest::new("u-1", "hello", None);
        let json = serde_json::to_string(&request).expect("request should serialize");

        assert_eq!(
            json,
            r#"{"user_id":"u-1","message":"hello","session_id":null}"#
        );
    }

    #[test]
    fn assigned_session_is_carried_verbatim() {
        let request = ChatRequest::new("u-1", "hello", Some("s-9".to_string()));
        let json = serde_json::to_string(&request).expect("request should serialize");

        assert_eq!(
            json,
            r#"{"user_id":"u-1","message":"hello","session_id":"s-9"}"#
        );
    }
}
