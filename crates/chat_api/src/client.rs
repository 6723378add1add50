use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde_json::json;

use crate::config::ChatApiConfig;
use crate::error::{parse_error_message, ChatApiError};
use crate::events::ChatStreamEvent;
use crate::headers::build_headers;
use crate::history::{HistoryEnvelope, HistoryTurn, SessionRecord};
use crate::payload::ChatRequest;
use crate::replay::ReplayResponse;
use crate::sse::SseStreamParser;
use crate::url::{chat_endpoint, history_endpoint, session_history_endpoint};

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
enum Flow {
    Continue,
    Done,
}

#[derive(Debug)]
pub struct ChatApiClient {
    http: Client,
    config: ChatApiConfig,
}

impl ChatApiClient {
    pub fn new(config: ChatApiConfig) -> Result<Self, ChatApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ChatApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ChatApiConfig {
        &self.config
    }

    fn header_map(&self) -> Result<HeaderMap, ChatApiError> {
        let headers = build_headers(&self.config);
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| ChatApiError::InvalidHeader(format!("invalid header key: {key}")))?,
                HeaderValue::from_str(&value).map_err(|_| {
                    ChatApiError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    fn build_send_request(
        &self,
        request: &ChatRequest,
    ) -> Result<reqwest::RequestBuilder, ChatApiError> {
        Ok(self
            .http
            .post(chat_endpoint(&self.config.base_url))
            .headers(self.header_map()?)
            .json(request))
    }

    /// Issue one send request and feed every non-terminal protocol event
    /// to `on_event` in arrival order.
    ///
    /// Returns `Ok(())` only when the stream ended with a `done` event.
    /// A mid-stream `error` event, a stream that closes without any
    /// terminal event, and a stalled connection all surface as errors so
    /// the caller's retry policy treats them uniformly.
    pub async fn stream_with_handler<F>(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
        mut on_event: F,
    ) -> Result<(), ChatApiError>
    where
        F: FnMut(ChatStreamEvent),
    {
        let response = self.send(request, cancellation).await?;

        if is_event_stream(&response) {
            self.drive_sse(response, cancellation, &mut on_event).await
        } else {
            self.drive_replay(response, cancellation, &mut on_event)
                .await
        }
    }

    /// Convenience wrapper collecting the non-terminal events of one send.
    pub async fn stream(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Vec<ChatStreamEvent>, ChatApiError> {
        let mut events = Vec::new();
        self.stream_with_handler(request, cancellation, |event| events.push(event))
            .await?;
        Ok(events)
    }

    async fn send(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, ChatApiError> {
        let response = self.build_send_request(request)?.send();
        let response = await_or_cancel(response, cancellation)
            .await?
            .map_err(ChatApiError::from)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = await_or_cancel(response.text(), cancellation)
            .await?
            .unwrap_or_default();
        Err(ChatApiError::Status(status, parse_error_message(status, &body)))
    }

    async fn drive_sse(
        &self,
        response: Response,
        cancellation: Option<&CancellationSignal>,
        on_event: &mut dyn FnMut(ChatStreamEvent),
    ) -> Result<(), ChatApiError> {
        let mut bytes = response.bytes_stream();
        let mut parser = SseStreamParser::default();

        loop {
            let next = tokio::time::timeout(
                self.config.chunk_timeout,
                await_or_cancel(bytes.next(), cancellation),
            )
            .await;
            let chunk = match next {
                Ok(result) => result?,
                Err(_) => return Err(ChatApiError::Stalled(self.config.chunk_timeout)),
            };
            let Some(chunk) = chunk else {
                // Network close without a terminal frame is a failure,
                // never a silent success.
                return Err(ChatApiError::AbruptEnd);
            };
            let chunk = chunk.map_err(ChatApiError::from)?;

            for event in parser.feed(&chunk) {
                if let Flow::Done = dispatch(event, on_event)? {
                    return Ok(());
                }
            }
        }
    }

    async fn drive_replay(
        &self,
        response: Response,
        cancellation: Option<&CancellationSignal>,
        on_event: &mut dyn FnMut(ChatStreamEvent),
    ) -> Result<(), ChatApiError> {
        let body = await_or_cancel(response.text(), cancellation)
            .await?
            .map_err(ChatApiError::from)?;
        let replay = serde_json::from_str::<ReplayResponse>(&body)?;

        let mut first = true;
        for event in replay.into_events() {
            if !first {
                await_or_cancel(
                    tokio::time::sleep(self.config.replay_chunk_delay),
                    cancellation,
                )
                .await?;
            }
            first = false;

            if let Flow::Done = dispatch(event, on_event)? {
                return Ok(());
            }
        }

        Err(ChatApiError::AbruptEnd)
    }

    /// Fetch summary records for every stored session.
    pub async fn fetch_all_sessions(
        &self,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Vec<SessionRecord>, ChatApiError> {
        let response = self
            .http
            .get(history_endpoint(&self.config.base_url))
            .headers(self.header_map()?)
            .send();
        let response = await_or_cancel(response, cancellation)
            .await?
            .map_err(ChatApiError::from)?;
        let status = response.status();
        if !status.is_success() {
            let body = await_or_cancel(response.text(), cancellation)
                .await?
                .unwrap_or_default();
            return Err(ChatApiError::Status(status, parse_error_message(status, &body)));
        }

        let envelope = await_or_cancel(response.json::<HistoryEnvelope>(), cancellation)
            .await?
            .map_err(ChatApiError::from)?;
        if envelope.status.as_deref() == Some("success") {
            Ok(envelope.histories)
        } else {
            Err(ChatApiError::MalformedHistory(format!(
                "unexpected history status: {:?}",
                envelope.status
            )))
        }
    }

    /// Fetch the ordered message list for one session.
    pub async fn fetch_session_messages(
        &self,
        session_id: &str,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Vec<HistoryTurn>, ChatApiError> {
        let response = self
            .http
            .post(session_history_endpoint(&self.config.base_url))
            .headers(self.header_map()?)
            .json(&json!({ "session_id": session_id }))
            .send();
        let response = await_or_cancel(response, cancellation)
            .await?
            .map_err(ChatApiError::from)?;
        let status = response.status();
        if !status.is_success() {
            let body = await_or_cancel(response.text(), cancellation)
                .await?
                .unwrap_or_default();
            return Err(ChatApiError::Status(status, parse_error_message(status, &body)));
        }

        await_or_cancel(response.json::<Vec<HistoryTurn>>(), cancellation)
            .await?
            .map_err(ChatApiError::from)
    }
}

fn dispatch(
    event: ChatStreamEvent,
    on_event: &mut dyn FnMut(ChatStreamEvent),
) -> Result<Flow, ChatApiError> {
    match event {
        ChatStreamEvent::Error { content } => Err(ChatApiError::StreamFailed { message: content }),
        ChatStreamEvent::Done => Ok(Flow::Done),
        other => {
            on_event(other);
            Ok(Flow::Continue)
        }
    }
}

fn is_event_stream(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/event-stream"))
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, ChatApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(ChatApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(ChatApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{dispatch, Flow};
    use crate::error::ChatApiError;
    use crate::events::ChatStreamEvent;
    use crate::sse::SseStreamParser;

    #[test]
    fn dispatch_forwards_non_terminal_events_in_order() {
        let frames = concat!(
            "data: {\"type\":\"info\",\"session_id\":\"s-1\"}\n\n",
            "data: {\"type\":\"chunk\",\"content\":\"A\"}\n\n",
            "data: {\"type\":\"chunk\",\"content\":\"B\"}\n\n",
        );
        let mut observed = Vec::new();

        for event in SseStreamParser::parse_frames(frames) {
            let flow = dispatch(event, &mut |event| observed.push(event))
                .expect("non-terminal events should dispatch");
            assert!(matches!(flow, Flow::Continue));
        }

        assert_eq!(
            observed,
            vec![
                ChatStreamEvent::Info {
                    session_id: Some("s-1".to_string()),
                },
                ChatStreamEvent::Chunk {
                    content: "A".to_string(),
                    references: None,
                },
                ChatStreamEvent::Chunk {
                    content: "B".to_string(),
                    references: None,
                },
            ]
        );
    }

    #[test]
    fn dispatch_stops_on_done_without_forwarding_it() {
        let mut observed = Vec::new();
        let flow = dispatch(ChatStreamEvent::Done, &mut |event| observed.push(event))
            .expect("done should dispatch");

        assert!(matches!(flow, Flow::Done));
        assert!(observed.is_empty());
    }

    #[test]
    fn dispatch_raises_stream_failure_on_error_event() {
        let mut observed = Vec::new();
        let error = dispatch(
            ChatStreamEvent::Error {
                content: "model exploded".to_string(),
            },
            &mut |event| observed.push(event),
        )
        .expect_err("error event must fail the stream");

        assert!(matches!(
            error,
            ChatApiError::StreamFailed { message } if message == "model exploded"
        ));
        assert!(observed.is_empty());
    }
}
