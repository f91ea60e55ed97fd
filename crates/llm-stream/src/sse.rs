// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Incremental decoder for `text/event-stream` chat responses
//!
//! Network reads split frames at arbitrary byte offsets, so bytes are
//! buffered until a newline completes a line. Only `data:` lines carry
//! payloads; `data: [DONE]` ends the stream. A frame whose JSON does not
//! parse is logged and skipped.

use serde_json::Value;
use tracing::warn;

use crate::types::StreamChunk;

const DATA_PREFIX: &str = "data:";
const DONE_MARKER: &str = "[DONE]";

/// A decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// A parsed chunk
    Chunk(StreamChunk),
    /// The end-of-stream marker
    Done,
}

/// Line-buffering SSE decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    skipped: usize,
}

impl SseDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes and return every frame completed by them, in order
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&byte| byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(frame) = self.decode_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush a final line left unterminated when the body ends
    pub fn finish(&mut self) -> Option<SseFrame> {
        let line = std::mem::take(&mut self.buffer);
        self.decode_line(&line)
    }

    /// Number of frames dropped because their payload did not parse
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<SseFrame> {
        let Ok(line) = std::str::from_utf8(line) else {
            warn!("Skipping SSE line that is not UTF-8");
            self.skipped += 1;
            return None;
        };

        let data = line.trim().strip_prefix(DATA_PREFIX)?.trim();
        if data.is_empty() {
            return None;
        }
        if data == DONE_MARKER {
            return Some(SseFrame::Done);
        }

        match serde_json::from_str::<Value>(data).and_then(StreamChunk::from_sse_data) {
            Ok(chunk) => Some(SseFrame::Chunk(chunk)),
            Err(error) => {
                warn!(%error, frame = data, "Skipping malformed SSE frame");
                self.skipped += 1;
                None
            }
        }
    }
}
