use citations::render_message;

use crate::transcript::Message;

/// Lifecycle of one in-flight assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Streaming,
    Complete,
    Failed,
}

/// Owner of the in-flight assistant message.
///
/// Appends arriving deltas, tracks the reference list supplied
/// out-of-band by chunk events (last-write-wins), and materializes a
/// renderable snapshot by re-running the full extraction/linking
/// pipeline over the accumulated text. Once the state leaves
/// `Streaming` the accumulator is frozen; late deltas are dropped.
#[derive(Debug, Clone)]
pub struct StreamAccumulator {
    state: StreamState,
    raw_text: String,
    references: Option<Vec<String>>,
    created_at: String,
}

impl StreamAccumulator {
    /// Starts streaming and empty at the moment the user's message is
    /// accepted; `created_at` is immutable from then on.
    #[must_use]
    pub fn new(created_at: impl Into<String>) -> Self {
        Self {
            state: StreamState::Streaming,
            raw_text: String::new(),
            references: None,
            created_at: created_at.into(),
        }
    }

    #[must_use]
    pub fn state(&self) -> StreamState {
        self.state
    }

    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Append one delta; a non-absent reference list replaces the held
    /// one wholesale. Dropped with a diagnostic outside `Streaming`.
    pub fn append_delta(&mut self, content: &str, references: Option<Vec<String>>) {
        if self.state != StreamState::Streaming {
            log::warn!("dropping delta for a frozen message");
            return;
        }

        self.raw_text.push_str(content);
        if let Some(references) = references {
            self.references = Some(references);
        }
    }

    /// Freeze with a final extraction/linking pass.
    pub fn complete(&mut self) {
        if self.state != StreamState::Streaming {
            return;
        }
        self.state = StreamState::Complete;
    }

    /// Freeze with an error-annotated text replacing any partial output.
    pub fn fail(&mut self, message: &str) {
        if self.state != StreamState::Streaming {
            return;
        }
        self.state = StreamState::Failed;
        self.raw_text = format!("Error: {message}");
        self.references = None;
    }

    /// Discard partial output from a failed attempt and return to the
    /// empty streaming state in place, keeping the creation timestamp.
    pub fn reset_for_retry(&mut self) {
        self.state = StreamState::Streaming;
        self.raw_text.clear();
        self.references = None;
    }

    /// Current renderable snapshot of the in-flight message.
    #[must_use]
    pub fn materialize(&self) -> Message {
        let rendered = render_message(&self.raw_text, self.references.as_deref());
        let mut message = Message::assistant(rendered.html, self.created_at.clone());
        message.references = rendered.references;
        message.streaming = self.state == StreamState::Streaming;
        message
    }
}
