//! Client engine for a streamed chat service.
//!
//! [`app::ChatApp`] is the pure state machine: it owns the transcript,
//! the session identity, the in-flight stream accumulator, and the
//! retry budget. [`controller::ChatController`] drives it against the
//! real transport and persists the session identity between runs. The
//! remaining modules are the parts the machine is assembled from.

pub mod accumulator;
pub mod app;
pub mod controller;
pub mod history;
pub mod retry;
pub mod transcript;

pub use accumulator::{StreamAccumulator, StreamState};
pub use app::{AttemptOutcome, ChatApp, Mode, SendId};
pub use controller::{ChatController, EventStreamClient, HttpChatClient, SendOutcome};
pub use history::{
    session_title, summarize_sessions, turns_to_messages, HistoryStore, SessionSummary,
};
pub use retry::{retry_delay, retry_notice, RetryCoordinator, RetryDecision, MAX_RETRIES};
pub use transcript::{Message, Sender, GREETING};
