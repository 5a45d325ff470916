//! Incremental SSE (Server-Sent Events) parser.
//!
//! Handles:
//! - Partial frames across TCP chunks
//! - Multi-line data fields
//! - CRLF and LF line endings
//! - Buffer compaction to prevent unbounded growth
//!
//! Lines must end in LF or CRLF. A bare CR is not treated as a line
//! terminator. Fields whose value is not valid UTF-8 are skipped.

use bytes::{Buf, BytesMut};
use memchr::memchr;

/// A parsed SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Line-based SSE parser.
pub struct SseParser {
    buffer: BytesMut,
    /// Offset of unconsumed data in buffer.
    consumed: usize,
}

impl SseParser {
    /// Create a new parser with default buffer capacity.
    pub fn new() -> Self {
        Self::with_capacity(8192)
    }

    /// Create a new parser with specified initial capacity.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(cap),
            consumed: 0,
        }
    }

    /// Feed bytes into the parser.
    #[inline]
    pub fn feed(&mut self, data: &[u8]) {
        if self.consumed == self.buffer.len() {
            self.buffer.clear();
            self.consumed = 0;
        } else if self.consumed > self.buffer.len() / 2 && self.consumed > 4096 {
            self.compact();
        }
        self.buffer.extend_from_slice(data);
    }

    /// Compact buffer by removing consumed bytes.
    fn compact(&mut self) {
        if self.consumed > 0 {
            self.buffer.advance(self.consumed);
            self.consumed = 0;
        }
    }

    /// Try to parse the next complete event.
    /// Returns `None` if more data is needed.
    pub fn next_event(&mut self) -> Option<SseEvent> {
        loop {
            let buf = &self.buffer[self.consumed..];
            let mut pos = 0;
            let mut event_end = None;

            while let Some(i) = memchr(b'\n', &buf[pos..]) {
                let line = trim_cr(&buf[pos..pos + i]);
                pos += i + 1;
                if line.is_empty() {
                    event_end = Some(pos);
                    break;
                }
            }

            let event_end = event_end?;
            let event = parse_block(&buf[..event_end]);
            self.consumed += event_end;

            // Blocks without data (comments, keep-alives) are skipped.
            if event.is_some() {
                return event;
            }
        }
    }

    /// Flush a trailing event that was not terminated by a blank line.
    ///
    /// Call once the underlying byte stream has ended.
    pub fn finish(&mut self) -> Option<SseEvent> {
        if let Some(event) = self.next_event() {
            return Some(event);
        }
        let event = parse_block(&self.buffer[self.consumed..]);
        self.reset();
        event
    }

    /// Reset parser state.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.consumed = 0;
    }

    /// Current buffer size.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len() - self.consumed
    }
}

impl Default for SseParser {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Parse the fields of one event block. Returns `None` if it carries no data.
fn parse_block(block: &[u8]) -> Option<SseEvent> {
    let mut data: Option<String> = None;
    let mut event = None;

    for line in block.split(|b| *b == b'\n').map(trim_cr) {
        // Lines starting with ':' are comments
        if line.is_empty() || line.starts_with(b":") {
            continue;
        }

        let (field, value) = match memchr(b':', line) {
            Some(colon) => {
                let value = &line[colon + 1..];
                (&line[..colon], value.strip_prefix(b" ").unwrap_or(value))
            }
            None => (line, &b""[..]),
        };
        let Ok(value) = std::str::from_utf8(value) else {
            continue;
        };

        match field {
            b"data" => match data.as_mut() {
                Some(d) => {
                    d.push('\n');
                    d.push_str(value);
                }
                None => data = Some(value.to_string()),
            },
            b"event" => event = Some(value.to_string()),
            _ => {}
        }
    }

    data.filter(|d| !d.is_empty())
        .map(|data| SseEvent { event, data })
}
