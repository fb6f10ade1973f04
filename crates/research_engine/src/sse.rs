//! Incremental `text/event-stream` decoder.
//!
//! Bytes are buffered until a full line is available, so multi-byte UTF-8
//! sequences split across chunks decode correctly. Lines end in CRLF, LF or
//! a lone CR, and a leading byte order mark is skipped.

use std::time::Duration;

use bytes::{Buf, BytesMut};
use engine_logging::engine_warn;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Longest line kept while waiting for its terminator.
pub const MAX_LINE_BYTES: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the `event:` field, if any.
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

impl SseEvent {
    /// Untyped events and `message` events are delivered as frames.
    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("") | Some("message"))
    }
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: BytesMut,
    /// Bytes of `buffer` already searched for a line terminator.
    scanned: usize,
    /// The previous line ended in `\r`; a following `\n` belongs to it.
    after_cr: bool,
    /// Dropping the rest of an over-long line.
    skipping_line: bool,
    stream_started: bool,
    data: Vec<String>,
    event: Option<String>,
    last_event_id: Option<String>,
    retry: Option<Duration>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every event completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        if !self.skip_bom() {
            return events;
        }

        loop {
            if self.after_cr {
                match self.buffer.first() {
                    None => break,
                    Some(b'\n') => self.buffer.advance(1),
                    Some(_) => {}
                }
                self.after_cr = false;
            }

            let Some(offset) = self.buffer[self.scanned..]
                .iter()
                .position(|b| *b == b'\n' || *b == b'\r')
            else {
                self.scanned = self.buffer.len();
                break;
            };
            let line = self.buffer.split_to(self.scanned + offset);
            self.after_cr = self.buffer[0] == b'\r';
            self.buffer.advance(1);
            self.scanned = 0;

            if std::mem::take(&mut self.skipping_line) {
                continue;
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        if self.buffer.len() > MAX_LINE_BYTES {
            engine_warn!("dropping SSE line longer than {} bytes", MAX_LINE_BYTES);
            self.buffer.clear();
            self.scanned = 0;
            self.skipping_line = true;
        }
        events
    }

    /// Drops a partially received event. `id` and `retry` survive reconnects,
    /// and the next chunk starts a new stream.
    pub fn discard_pending(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
        self.after_cr = false;
        self.skipping_line = false;
        self.stream_started = false;
        self.data.clear();
        self.event = None;
    }

    /// Strips a byte order mark at the start of the stream. Returns false while
    /// the buffered bytes could still be the start of one.
    fn skip_bom(&mut self) -> bool {
        if self.stream_started {
            return true;
        }
        if self.buffer.len() < BOM.len() && BOM.starts_with(&self.buffer) {
            return false;
        }
        if self.buffer.starts_with(BOM) {
            self.buffer.advance(BOM.len());
        }
        self.stream_started = true;
        true
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Reconnection delay requested by the server.
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
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
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" if !value.contains('\0') => self.last_event_id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event,
            data,
            id: self.last_event_id.clone(),
        })
    }
}
