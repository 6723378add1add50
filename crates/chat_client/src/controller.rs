use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chat_api::{
    CancellationSignal, ChatApiClient, ChatApiConfig, ChatApiError, ChatRequest, ChatStreamEvent,
    HistoryTurn, SessionRecord,
};
use session_store::{ChatSession, SessionStore};

use crate::app::{AttemptOutcome, ChatApp, SendId};
use crate::history::{summarize_sessions, turns_to_messages, HistoryStore, SessionSummary};

/// Blocking transport seam for one send operation.
///
/// The production implementation wraps the async HTTP client behind a
/// runtime; tests substitute a scripted fake. Terminal protocol events
/// are resolved inside the transport, so `on_event` only ever sees
/// `info` and `chunk` events.
pub trait EventStreamClient {
    fn stream(
        &self,
        request: &ChatRequest,
        cancellation: &CancellationSignal,
        on_event: &mut dyn FnMut(ChatStreamEvent),
    ) -> Result<(), ChatApiError>;
}

/// Production transport: drives [`ChatApiClient`] to completion on a
/// current-thread runtime so synchronous callers can use it directly.
pub struct HttpChatClient {
    client: ChatApiClient,
}

impl HttpChatClient {
    pub fn new(config: ChatApiConfig) -> Result<Self, ChatApiError> {
        Ok(Self {
            client: ChatApiClient::new(config)?,
        })
    }

    fn runtime(&self) -> Result<tokio::runtime::Runtime, ChatApiError> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| ChatApiError::Runtime(err.to_string()))
    }
}

impl EventStreamClient for HttpChatClient {
    fn stream(
        &self,
        request: &ChatRequest,
        cancellation: &CancellationSignal,
        on_event: &mut dyn FnMut(ChatStreamEvent),
    ) -> Result<(), ChatApiError> {
        let runtime = self.runtime()?;
        runtime.block_on(
            self.client
                .stream_with_handler(request, Some(cancellation), on_event),
        )
    }
}

impl HistoryStore for HttpChatClient {
    fn fetch_all_sessions(&self) -> Result<Vec<SessionRecord>, String> {
        let runtime = self.runtime().map_err(|err| err.to_string())?;
        runtime
            .block_on(self.client.fetch_all_sessions(None))
            .map_err(|err| err.to_string())
    }

    fn fetch_session_messages(&self, session_id: &str) -> Result<Vec<HistoryTurn>, String> {
        let runtime = self.runtime().map_err(|err| err.to_string())?;
        runtime
            .block_on(self.client.fetch_session_messages(session_id, None))
            .map_err(|err| err.to_string())
    }
}

/// Outcome of one complete send operation, after all retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The input was empty or a send was already in flight.
    Rejected,
    Completed,
    /// Every attempt failed; the transcript holds a failed message.
    Failed,
    Cancelled,
}

/// Synchronous driver wiring the [`ChatApp`] state machine to the
/// transport, the history endpoints, and on-disk session persistence.
pub struct ChatController {
    app: ChatApp,
    transport: Box<dyn EventStreamClient>,
    history: Box<dyn HistoryStore>,
    store: SessionStore,
    cancellation: CancellationSignal,
    backoff: Box<dyn Fn(Duration)>,
}

impl ChatController {
    /// Restore the persisted session identity if one exists, otherwise
    /// start a fresh one for `user_id`.
    pub fn new(
        transport: Box<dyn EventStreamClient>,
        history: Box<dyn HistoryStore>,
        store_path: impl Into<PathBuf>,
        user_id: &str,
    ) -> Result<Self, session_store::SessionStoreError> {
        let store = SessionStore::new(store_path);
        let session = match store.load()? {
            Some(session) => session,
            None => ChatSession::new(user_id),
        };

        Ok(Self {
            app: ChatApp::new(session),
            transport,
            history,
            store,
            cancellation: Arc::new(AtomicBool::new(false)),
            backoff: Box::new(|delay| thread::sleep(delay)),
        })
    }

    /// Replace how the controller waits out retry backoff delays.
    /// Tests install a recorder here instead of sleeping for real.
    pub fn set_backoff_sleeper(&mut self, sleeper: impl Fn(Duration) + 'static) {
        self.backoff = Box::new(sleeper);
    }

    #[must_use]
    pub fn app(&self) -> &ChatApp {
        &self.app
    }

    /// Signal that can be flipped from another thread to abort the
    /// in-flight send. It is re-armed at the start of every send.
    #[must_use]
    pub fn cancellation(&self) -> CancellationSignal {
        Arc::clone(&self.cancellation)
    }

    /// Run one send operation to completion, retrying failed attempts
    /// with exponential backoff until success, cancellation, or an
    /// exhausted budget.
    pub fn send_user_message(&mut self, text: &str) -> SendOutcome {
        let Some(send_id) = self.app.begin_send(text) else {
            return SendOutcome::Rejected;
        };
        self.cancellation.store(false, Ordering::Relaxed);

        loop {
            match self.run_attempt(send_id) {
                Ok(()) => {
                    self.app.on_send_completed(send_id);
                    return SendOutcome::Completed;
                }
                Err(ChatApiError::Cancelled) => {
                    log::info!("send {send_id} cancelled");
                    self.app.abort_send(send_id);
                    return SendOutcome::Cancelled;
                }
                Err(err) => {
                    log::warn!("send {send_id} attempt failed: {err}");
                    match self.app.on_attempt_failed(send_id, &err.to_string()) {
                        AttemptOutcome::Retry { delay } => {
                            (self.backoff)(delay);
                        }
                        AttemptOutcome::Exhausted => {
                            self.persist();
                            return SendOutcome::Failed;
                        }
                        AttemptOutcome::Stale => return SendOutcome::Cancelled,
                    }
                }
            }
        }
    }

    fn run_attempt(&mut self, send_id: SendId) -> Result<(), ChatApiError> {
        let session = self.app.session();
        let request = ChatRequest::new(
            session.user_id.clone(),
            self.app
                .last_input()
                .unwrap_or_default(),
            session.session_id.clone(),
        );

        let mut session_changed = false;
        let app = &mut self.app;
        let result = self.transport.stream(&request, &self.cancellation, &mut |event| {
            if app.on_stream_event(send_id, event) {
                session_changed = true;
            }
        });

        if session_changed {
            self.persist();
        }
        result
    }

    /// Re-send the text of the last (failed) send.
    pub fn retry_last_send(&mut self) -> SendOutcome {
        let Some(text) = self.app.last_input().map(str::to_string) else {
            return SendOutcome::Rejected;
        };
        self.send_user_message(&text)
    }

    /// Reset to a fresh conversation and persist the cleared identity.
    pub fn start_new_chat(&mut self) {
        self.cancellation.store(true, Ordering::Relaxed);
        if self.app.start_new_chat() {
            self.persist();
        }
    }

    /// Fetch and summarize every stored session for the picker.
    pub fn sessions(&self) -> Result<Vec<SessionSummary>, String> {
        let records = self.history.fetch_all_sessions()?;
        Ok(summarize_sessions(&records))
    }

    /// Load an existing session's transcript and switch to it.
    pub fn select_chat(&mut self, session_id: &str) -> Result<(), String> {
        let turns = self.history.fetch_session_messages(session_id)?;
        self.cancellation.store(true, Ordering::Relaxed);
        if self.app.select_chat(session_id, turns_to_messages(&turns)) {
            self.persist();
        }
        Ok(())
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(self.app.session()) {
            log::warn!("failed to persist session: {err}");
        }
    }
}
