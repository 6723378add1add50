//! Transport-only chat API client primitives.
//!
//! This crate owns request building, response streaming, and protocol
//! event decoding for the chat backend. It intentionally contains no
//! transcript state, no retry policy, and no rendering concerns; those
//! live in `chat_client`.
//!
//! Two wire variants are normalized into the same [`ChatStreamEvent`]
//! stream: true server-sent events (`data: <json>` frames separated by
//! blank lines) and a single-shot JSON body whose `chunks` array is
//! replayed with a fixed inter-chunk delay.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod headers;
pub mod history;
pub mod payload;
pub mod replay;
pub mod sse;
pub mod url;

pub use client::{CancellationSignal, ChatApiClient};
pub use config::ChatApiConfig;
pub use error::ChatApiError;
pub use events::ChatStreamEvent;
pub use history::{HistoryTurn, SessionRecord};
pub use payload::ChatRequest;
pub use replay::ReplayResponse;
pub use sse::SseStreamParser;
