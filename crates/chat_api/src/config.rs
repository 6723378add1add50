use std::collections::BTreeMap;
use std::time::Duration;

use crate::url::DEFAULT_CHAT_BASE_URL;

/// Kept generous because the backend may stall between deltas while the
/// model is still producing output.
pub const DEFAULT_CHUNK_TIMEOUT: Duration = Duration::from_secs(30);

/// Pacing delay between replayed chunks of a single-shot response.
pub const DEFAULT_REPLAY_CHUNK_DELAY: Duration = Duration::from_millis(50);

/// Transport configuration for chat API requests.
#[derive(Debug, Clone)]
pub struct ChatApiConfig {
    /// Base URL for chat endpoints.
    pub base_url: String,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Additional headers merged into request headers.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional whole-request timeout.
    pub timeout: Option<Duration>,
    /// Maximum wait for the next stream chunk before the connection is
    /// treated as stalled.
    pub chunk_timeout: Duration,
    /// Delay inserted between chunks replayed from a single-shot body.
    pub replay_chunk_delay: Duration,
}

impl Default for ChatApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CHAT_BASE_URL.to_string(),
            user_agent: None,
            extra_headers: BTreeMap::new(),
            timeout: None,
            chunk_timeout: DEFAULT_CHUNK_TIMEOUT,
            replay_chunk_delay: DEFAULT_REPLAY_CHUNK_DELAY,
        }
    }
}

impl ChatApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_chunk_timeout(mut self, chunk_timeout: Duration) -> Self {
        self.chunk_timeout = chunk_timeout;
        self
    }

    pub fn with_replay_chunk_delay(mut self, delay: Duration) -> Self {
        self.replay_chunk_delay = delay;
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.extra_headers.extend(headers);
        self
    }
}
