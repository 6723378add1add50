use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum ChatApiError {
    InvalidHeader(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    Serde(JsonError),
    /// A mid-stream `error` event carrying the server's message.
    StreamFailed { message: String },
    /// The stream closed without a `done` or `error` terminal event.
    AbruptEnd,
    /// No chunk arrived within the configured per-chunk timeout.
    Stalled(Duration),
    MalformedHistory(String),
    Runtime(String),
    Cancelled,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl fmt::Display for ChatApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHeader(value) => write!(f, "invalid header: {value}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::StreamFailed { message } => write!(f, "stream failed: {message}"),
            Self::AbruptEnd => write!(f, "stream ended without a terminal event"),
            Self::Stalled(timeout) => {
                write!(f, "stream stalled for more than {}s", timeout.as_secs())
            }
            Self::MalformedHistory(message) => write!(f, "malformed history payload: {message}"),
            Self::Runtime(message) => write!(f, "runtime error: {message}"),
            Self::Cancelled => write!(f, "request was cancelled"),
        }
    }
}

impl std::error::Error for ChatApiError {}

impl From<reqwest::Error> for ChatApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for ChatApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Extract a human-readable message from a non-success response body.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed
            .error
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            return message.to_string();
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}
