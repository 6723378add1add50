use crate::events::ChatStreamEvent;

/// Incremental parser for SSE text streams.
///
/// Frames are delimited by a blank line; each frame's `data:` lines are
/// joined and parsed as one JSON protocol event. A frame that fails to
/// parse is logged and skipped without terminating the stream.
///
/// Input is buffered as raw bytes and decoded per complete frame, so a
/// multi-byte character split across transport chunks arrives intact.
#[derive(Debug, Default)]
pub struct SseStreamParser {
    buffer: Vec<u8>,
}

impl SseStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ChatStreamEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(split) = self.buffer.windows(2).position(|window| window == b"\n\n") {
            let frame = String::from_utf8_lossy(&self.buffer[..split]).into_owned();
            self.buffer.drain(0..split + 2);

            let Some(payload) = extract_data_payload(&frame) else {
                continue;
            };

            match serde_json::from_str::<ChatStreamEvent>(&payload) {
                Ok(event) => events.push(event),
                Err(error) => {
                    log::warn!("skipping malformed SSE frame: {error}: {payload}");
                }
            }
        }

        events
    }

    /// Parse a complete SSE payload string in one shot.
    pub fn parse_frames(input: &str) -> Vec<ChatStreamEvent> {
        let mut parser = Self::default();
        parser.feed(input.as_bytes())
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.iter().all(u8::is_ascii_whitespace)
    }
}

fn extract_data_payload(frame: &str) -> Option<String> {
    let data_lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::SseStreamParser;
    use crate::events::ChatStreamEvent;

    #[test]
    fn parse_sse_frames_incrementally() {
        let mut parser = SseStreamParser::default();
        let mut events = Vec::new();

        events.extend(parser.feed(b"data: {\"type\":\"chunk\",\"con"));
        assert!(events.is_empty());

        events.extend(parser.feed(b"tent\":\"Hello\"}\n\ndata: {\"type\":\"done\"}\n\n"));
        assert_eq!(
            events,
            vec![
                ChatStreamEvent::Chunk {
                    content: "Hello".to_string(),
                    references: None,
                },
                ChatStreamEvent::Done,
            ]
        );
        assert!(parser.is_empty_buffer());
    }

    #[test]
    fn multibyte_characters_survive_a_chunk_boundary_split() {
        let frame = "data: {\"type\":\"chunk\",\"content\":\"caf\u{e9}\"}\n\n".as_bytes();
        // Split between the two bytes of the UTF-8 encoding of 'é'.
        let split = frame.len() - 5;
        assert_eq!(frame[split - 1], 0xC3);
        assert_eq!(frame[split], 0xA9);

        let mut parser = SseStreamParser::default();
        let mut events = Vec::new();
        events.extend(parser.feed(&frame[..split]));
        assert!(events.is_empty());
        events.extend(parser.feed(&frame[split..]));

        assert_eq!(
            events,
            vec![ChatStreamEvent::Chunk {
                content: "caf\u{e9}".to_string(),
                references: None,
            }]
        );
        assert!(parser.is_empty_buffer());
    }

    #[test]
    fn malformed_frames_are_skipped_without_poisoning_the_stream() {
        let events = SseStreamParser::parse_frames(concat!(
            "data: not json\n\n",
            "data: {\"type\":\"chunk\",\"content\":\"ok\"}\n\n",
            "data: {\"unknown\":true}\n\n",
        ));

        assert_eq!(
            events,
            vec![ChatStreamEvent::Chunk {
                content: "ok".to_string(),
                references: None,
            }]
        );
    }

    #[test]
    fn non_data_lines_are_ignored() {
        let events = SseStreamParser::parse_frames(concat!(
            ": keepalive\n\n",
            "event: message\ndata: {\"type\":\"info\",\"session_id\":\"s-1\"}\n\n",
        ));

        assert_eq!(
            events,
            vec![ChatStreamEvent::Info {
                session_id: Some("s-1".to_string()),
            }]
        );
    }

    #[test]
    fn frames_parse_in_arrival_order() {
        let events = SseStreamParser::parse_frames(concat!(
            "data: {\"type\":\"chunk\",\"content\":\"A\"}\n\n",
            "data: {\"type\":\"chunk\",\"content\":\"B\"}\n\n",
        ));

        assert_eq!(
            events,
            vec![
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
}
