//! SSE line framing for the `/agents/chat` byte stream.
//!
//! Transport chunks split lines arbitrarily, sometimes inside a
//! multi-byte UTF-8 sequence, so the carry-over buffer holds raw bytes
//! and decoding happens per complete line.

use vietsu_types::stream::StreamEvent;

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_SENTINEL: &str = "[DONE]";

/// Reassembles newline-delimited lines from arbitrary byte chunks.
#[derive(Default)]
pub struct LineSplitter {
    buffer: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns every line completed by it. The bytes
    /// after the last newline stay buffered for the next chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let rest = self.buffer.split_off(pos + 1);
            let mut line = std::mem::replace(&mut self.buffer, rest);
            line.pop(); // the newline
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Bytes held back waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Outcome of examining one line from the stream.
pub enum SseLine {
    /// A decoded event payload.
    Event(StreamEvent),
    /// The `data: [DONE]` terminator.
    Done,
    /// Blank line, non-data line, or undecodable payload. Skipped.
    Ignored,
}

/// Classify a single line. Payloads that fail to parse as JSON are
/// ignored rather than failing the stream; the backend occasionally
/// emits partial frames under load.
pub fn parse_line(line: &str) -> SseLine {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return SseLine::Ignored;
    };
    if payload == DONE_SENTINEL {
        return SseLine::Done;
    }
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => SseLine::Event(event),
        Err(e) => {
            log::debug!("Skipping undecodable stream line: {}", e);
            SseLine::Ignored
        }
    }
}
