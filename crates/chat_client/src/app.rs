use std::time::Duration;

use chat_api::ChatStreamEvent;
use session_store::ChatSession;

use crate::accumulator::StreamAccumulator;
use crate::retry::{retry_notice, RetryCoordinator, RetryDecision};
use crate::transcript::{now_rfc3339, Message, Sender};

/// Monotonic token identifying one logical send operation.
///
/// Every stream event is checked against the active token so events
/// from an abandoned stream can never mutate later state.
pub type SendId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Sending { send_id: SendId },
    /// Retries exhausted; the message carries the last stream error.
    Error(String),
}

/// Decision returned to the driver after one failed send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Re-send the same user text after sleeping `delay`.
    Retry { delay: Duration },
    /// Retry budget spent; the message is frozen as failed.
    Exhausted,
    /// The failure belongs to an abandoned send; ignore it.
    Stale,
}

/// Pure state machine for one chat surface.
///
/// Owns the transcript and the session record exclusively; the driver
/// in [`crate::controller`] feeds it lifecycle events and performs the
/// I/O (transport, persistence, history fetches) around it.
#[derive(Debug, Clone)]
pub struct ChatApp {
    mode: Mode,
    transcript: Vec<Message>,
    session: ChatSession,
    accumulator: Option<StreamAccumulator>,
    retry: RetryCoordinator,
    next_send_id: SendId,
    notice: Option<String>,
    last_input: Option<String>,
}

impl ChatApp {
    #[must_use]
    pub fn new(session: ChatSession) -> Self {
        Self {
            mode: Mode::Idle,
            transcript: vec![Message::greeting(now_rfc3339())],
            session,
            accumulator: None,
            retry: RetryCoordinator::new(),
            next_send_id: 1,
            notice: None,
            last_input: None,
        }
    }

    #[must_use]
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    #[must_use]
    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    #[must_use]
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Transient banner text: a retry notice or the terminal error.
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    #[must_use]
    pub fn is_sending(&self) -> bool {
        matches!(self.mode, Mode::Sending { .. })
    }

    /// The most recently submitted user text, kept for the manual
    /// retry affordance after retries are exhausted.
    #[must_use]
    pub fn last_input(&self) -> Option<&str> {
        self.last_input.as_deref()
    }

    /// Accept a user message and open a send operation.
    ///
    /// Rejects empty/whitespace-only input and rejects a send while one
    /// is already in flight. On acceptance the transcript gains the
    /// user message plus an empty streaming assistant placeholder, and
    /// the retry budget for this logical send starts fresh.
    pub fn begin_send(&mut self, text: &str) -> Option<SendId> {
        let trimmed = text.trim();
        if trimmed.is_empty() || self.is_sending() {
            return None;
        }

        let send_id = self.next_send_id;
        self.next_send_id += 1;

        let timestamp = now_rfc3339();
        self.transcript.push(Message::user(trimmed, timestamp.clone()));

        let accumulator = StreamAccumulator::new(timestamp);
        self.transcript.push(accumulator.materialize());
        self.accumulator = Some(accumulator);

        self.mode = Mode::Sending { send_id };
        self.notice = None;
        self.retry.reset();
        self.last_input = Some(trimmed.to_string());

        Some(send_id)
    }

    /// Apply one non-terminal protocol event.
    ///
    /// Returns true when the session record mutated and should be
    /// persisted. Terminal events never reach this path; the transport
    /// resolves them into completion or failure of the whole attempt.
    pub fn on_stream_event(&mut self, send_id: SendId, event: ChatStreamEvent) -> bool {
        if !self.is_active_send(send_id) {
            log::debug!("ignoring event from abandoned send {send_id}");
            return false;
        }

        match event {
            ChatStreamEvent::Info { session_id } => match session_id {
                Some(session_id) => self.session.adopt_assigned(session_id),
                None => false,
            },
            ChatStreamEvent::Chunk {
                content,
                references,
            } => {
                if let Some(accumulator) = self.accumulator.as_mut() {
                    accumulator.append_delta(&content, references);
                }
                self.refresh_streaming_message();
                false
            }
            ChatStreamEvent::Error { .. } | ChatStreamEvent::Done => {
                log::debug!("terminal event reached the app; transport should resolve these");
                false
            }
        }
    }

    /// Finalize a send whose stream ended with `done`.
    pub fn on_send_completed(&mut self, send_id: SendId) {
        if !self.is_active_send(send_id) {
            return;
        }

        if let Some(accumulator) = self.accumulator.as_mut() {
            accumulator.complete();
        }
        self.refresh_streaming_message();
        self.accumulator = None;
        self.mode = Mode::Idle;
        self.notice = None;
        self.retry.reset();
    }

    /// Record one failed attempt and decide what the driver does next.
    ///
    /// While budget remains the in-flight message is reset to its empty
    /// streaming state in place, never appended as a new message, and a
    /// retry notice is surfaced. Once the budget is spent the message
    /// freezes with an error-annotated text.
    pub fn on_attempt_failed(&mut self, send_id: SendId, error: &str) -> AttemptOutcome {
        if !self.is_active_send(send_id) {
            return AttemptOutcome::Stale;
        }

        match self.retry.next_attempt() {
            RetryDecision::Retry { attempt, delay } => {
                self.notice = Some(retry_notice(attempt));
                if let Some(accumulator) = self.accumulator.as_mut() {
                    accumulator.reset_for_retry();
                }
                self.refresh_streaming_message();
                AttemptOutcome::Retry { delay }
            }
            RetryDecision::GiveUp => {
                if let Some(accumulator) = self.accumulator.as_mut() {
                    accumulator.fail(error);
                }
                self.refresh_streaming_message();
                self.accumulator = None;
                self.mode = Mode::Error(error.to_string());
                self.notice = Some(error.to_string());
                AttemptOutcome::Exhausted
            }
        }
    }

    /// Abort the in-flight send without consuming retry budget.
    ///
    /// The placeholder freezes as a failed message so the transcript
    /// never keeps a dangling streaming entry.
    pub fn abort_send(&mut self, send_id: SendId) {
        if !self.is_active_send(send_id) {
            return;
        }

        if let Some(accumulator) = self.accumulator.as_mut() {
            accumulator.fail("Cancelled");
        }
        self.refresh_streaming_message();
        self.accumulator = None;
        self.mode = Mode::Idle;
        self.notice = None;
        self.retry.reset();
    }

    /// Reset to a fresh conversation: unassigned session, greeting
    /// transcript, zeroed retry counter, and a bumped send epoch so
    /// events from any abandoned stream are dropped.
    ///
    /// Returns true when the session record mutated.
    pub fn start_new_chat(&mut self) -> bool {
        let had_assignment = self.session.session_id.is_some();
        self.session.clear_assignment();

        self.transcript = vec![Message::greeting(now_rfc3339())];
        self.accumulator = None;
        self.mode = Mode::Idle;
        self.notice = None;
        self.retry.reset();
        self.last_input = None;
        self.next_send_id += 1;

        had_assignment
    }

    /// Switch to an existing session with its loaded transcript.
    ///
    /// Returns true when the session record mutated.
    pub fn select_chat(&mut self, session_id: &str, mut messages: Vec<Message>) -> bool {
        let changed = self.session.session_id.as_deref() != Some(session_id);
        self.session.select(session_id);

        // Loaded history is settled by definition.
        for message in &mut messages {
            message.streaming = false;
        }
        if messages.is_empty() {
            messages.push(Message::greeting(now_rfc3339()));
        }
        self.transcript = messages;

        self.accumulator = None;
        self.mode = Mode::Idle;
        self.notice = None;
        self.retry.reset();
        self.last_input = None;
        self.next_send_id += 1;

        changed
    }

    fn is_active_send(&self, send_id: SendId) -> bool {
        matches!(self.mode, Mode::Sending { send_id: active } if active == send_id)
    }

    fn refresh_streaming_message(&mut self) {
        let Some(accumulator) = self.accumulator.as_ref() else {
            return;
        };

        if let Some(last) = self
            .transcript
            .iter_mut()
            .rev()
            .find(|message| message.sender == Sender::Assistant)
        {
            *last = accumulator.materialize();
        }
    }
}
