/// Default base URL for chat backend requests.
pub const DEFAULT_CHAT_BASE_URL: &str = "https://testingcosmo.azurewebsites.net";

/// Endpoint accepting `{user_id, message, session_id}` send requests.
pub fn chat_endpoint(base_url: &str) -> String {
    format!("{}/api/chatbot", normalize_base(base_url))
}

/// Endpoint listing all stored sessions for the installation.
pub fn history_endpoint(base_url: &str) -> String {
    format!("{}/api/getchathistory", normalize_base(base_url))
}

/// Endpoint returning the message list for one `session_id`.
pub fn session_history_endpoint(base_url: &str) -> String {
    format!("{}/api/getchathistorybysession", normalize_base(base_url))
}

fn normalize_base(input: &str) -> &str {
    let base = if input.trim().is_empty() {
        DEFAULT_CHAT_BASE_URL
    } else {
        input.trim()
    };
    base.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::{chat_endpoint, history_endpoint, session_history_endpoint, DEFAULT_CHAT_BASE_URL};

    #[test]
    fn endpoints_trim_trailing_slashes() {
        assert_eq!(
            chat_endpoint("https://host.example/"),
            "https://host.example/api/chatbot"
        );
        assert_eq!(
            history_endpoint("https://host.example//"),
            "https://host.example/api/getchathistory"
        );
        assert_eq!(
            session_history_endpoint("https://host.example"),
            "https://host.example/api/getchathistorybysession"
        );
    }

    #[test]
    fn empty_base_falls_back_to_default() {
        assert_eq!(
            chat_endpoint("  "),
            format!("{DEFAULT_CHAT_BASE_URL}/api/chatbot")
        );
    }
}
