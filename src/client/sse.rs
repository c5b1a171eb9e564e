//! Incremental decoder for a `text/event-stream` body.

use tracing::warn;

use crate::constants::MAX_SSE_LINE_BYTES;

/// One dispatched event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Event name, `message` when the stream gave none
    pub event: String,
    pub data: String,
}

/// Turns arbitrary byte chunks into complete events.
///
/// Lines end with `\n`, `\r\n` or a lone `\r`; a blank line dispatches the
/// pending event. Comment lines (keep-alives) and `id`/`retry` fields are
/// dropped. Events without data are discarded, as the format prescribes.
///
/// A line longer than the limit is thrown away together with the event it
/// belongs to.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    max_line: usize,
    // Previous chunk ended in `\r`; a leading `\n` belongs to it.
    skip_lf: bool,
    // Inside an oversized line, dropping bytes until its end.
    overflowed: bool,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line(MAX_SSE_LINE_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder refusing lines longer than `max_line` bytes
    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            buffer: Vec::new(),
            event: None,
            data: Vec::new(),
            max_line: max_line.max(1),
            skip_lf: false,
            overflowed: false,
        }
    }

    /// Feed a chunk; returns every event completed by it
    pub fn feed(&mut self, mut chunk: &[u8]) -> Vec<SseFrame> {
        if self.skip_lf && !chunk.is_empty() {
            self.skip_lf = false;
            if chunk[0] == b'\n' {
                chunk = &chunk[1..];
            }
        }
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n' || *b == b'\r') {
            let line: Vec<u8> = self.buffer.drain(..pos).collect();
            let terminator = self.buffer.remove(0);
            if terminator == b'\r' {
                match self.buffer.first() {
                    Some(b'\n') => {
                        self.buffer.remove(0);
                    }
                    Some(_) => {}
                    None => self.skip_lf = true,
                }
            }

            if self.overflowed {
                self.overflowed = false;
                self.event = None;
                self.data.clear();
                continue;
            }

            let line = String::from_utf8_lossy(&line);
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }

        if self.buffer.len() > self.max_line {
            warn!(
                len = self.buffer.len(),
                max = self.max_line,
                "dropping oversized event stream line"
            );
            self.buffer.clear();
            self.overflowed = true;
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_then_message() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(
            b"event: endpoint\r\ndata: /messages/?session_id=abc\r\n\r\nevent: message\r\ndata: {\"id\":\"1\"}\r\n\r\n",
        );
        assert_eq!(
            frames,
            vec![
                SseFrame {
                    event: "endpoint".to_string(),
                    data: "/messages/?session_id=abc".to_string()
                },
                SseFrame {
                    event: "message".to_string(),
                    data: "{\"id\":\"1\"}".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: mess").is_empty());
        assert!(decoder.feed(b"age\ndata: {\"a\"").is_empty());
        let frames = decoder.feed(b":1}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"a\":1}");
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let text = "data: héllo\n\n".as_bytes();
        let split = text.iter().position(|b| *b == 0xc3).unwrap() + 1;
        assert!(decoder.feed(&text[..split]).is_empty());
        let frames = decoder.feed(&text[split..]);
        assert_eq!(frames[0].data, "héllo");
    }

    #[test]
    fn test_comments_and_empty_events_ignored() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b": ping\n\nevent: endpoint\n\nid: 4\nretry: 10\n\n");
        assert!(frames.is_empty());
    }

    #[test]
    fn test_default_event_name_and_multiline_data() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"data: one\ndata:two\n\n");
        assert_eq!(frames[0].event, "message");
        assert_eq!(frames[0].data, "one\ntwo");
    }

    #[test]
    fn test_lone_carriage_return_ends_lines() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"event: endpoint\rdata: /messages/?session_id=a\r\rdata: x\r");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "endpoint");

        // `\r` closing one chunk and `\n` opening the next are one line end.
        let frames = decoder.feed(b"\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "x");
    }

    #[test]
    fn test_oversized_line_is_dropped_with_its_event() {
        let mut decoder = SseDecoder::with_max_line(16);
        assert!(decoder.feed(b"event: message\ndata: 0123456789abcdefXYZ").is_empty());
        assert!(decoder.feed(b"more bytes of the same line").is_empty());
        assert!(decoder.feed(b"\n\n").is_empty());

        let frames = decoder.feed(b"data: ok\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "ok");
    }
}
