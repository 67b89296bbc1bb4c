//! Stream consumer: turns the relay's byte stream into protocol frames and
//! accumulated text.
//!
//! The wire protocol is a sequence of UTF-8 text lines. Lines not beginning
//! with `data: ` are ignored; `data: [DONE]` signals end-of-stream; any
//! other payload is a JSON object carrying a content delta at
//! `choices[0].delta.content`.

use futures::{Stream, StreamExt};
use serde::Deserialize;
use sitechat_core::{AppError, AppResult, CancelToken};
use std::time::Duration;

/// A decoded unit from the relay's byte stream.
///
/// Transient: frames are never stored, only folded into the accumulated
/// text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// One incremental text fragment
    Delta(String),
    /// End-of-stream sentinel; no further content follows
    Done,
}

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Streamed payload shape: `{"choices":[{"delta":{"content":"..."}}]}`.
#[derive(Debug, Deserialize)]
struct DeltaPayload {
    #[serde(default)]
    choices: Vec<DeltaChoice>,
}

#[derive(Debug, Deserialize)]
struct DeltaChoice {
    #[serde(default)]
    delta: DeltaContent,
}

#[derive(Debug, Default, Deserialize)]
struct DeltaContent {
    #[serde(default)]
    content: Option<String>,
}

/// Incremental frame decoder with carry-over buffering.
///
/// Chunk boundaries do not align with line or multi-byte character
/// boundaries. The decoder appends raw bytes to an internal buffer and
/// parses only complete newline-terminated lines; the trailing partial
/// line is retained and prefixed onto the next chunk, so a frame is never
/// parsed from a line that has not been fully received.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    skipped: usize,
}

impl FrameDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of raw bytes, returning every frame it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop(); // trailing \n
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            if let Some(frame) = self.parse_line(&line) {
                frames.push(frame);
            }
        }

        frames
    }

    /// Number of malformed payload lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn parse_line(&mut self, line: &[u8]) -> Option<Frame> {
        let text = match std::str::from_utf8(line) {
            Ok(text) => text,
            Err(_) => {
                // A complete line that is not valid UTF-8: drop it, keep
                // decoding
                self.skipped += 1;
                tracing::warn!("Skipping non-UTF-8 stream line");
                return None;
            }
        };

        // Lines without the data prefix (comments, event names, blanks)
        // carry no frames
        let payload = text.strip_prefix(DATA_PREFIX)?;

        if payload == DONE_SENTINEL {
            return Some(Frame::Done);
        }

        match serde_json::from_str::<DeltaPayload>(payload) {
            Ok(parsed) => {
                let delta = parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content)
                    .unwrap_or_default();

                if delta.is_empty() {
                    // Empty or absent delta contributes no text
                    None
                } else {
                    Some(Frame::Delta(delta))
                }
            }
            Err(err) => {
                // One bad frame must not abort the whole stream
                self.skipped += 1;
                tracing::warn!("Skipping malformed stream payload: {}", err);
                None
            }
        }
    }
}

/// Consumes a relay byte stream into a final answer text.
pub struct StreamConsumer;

impl StreamConsumer {
    /// Read `stream` to completion, folding Delta frames into accumulated
    /// text.
    ///
    /// Deltas are delivered in the exact order bytes were read; `on_delta`
    /// observes each appended fragment for live display. Consumption stops
    /// at the `[DONE]` sentinel or EOF.
    ///
    /// # Errors
    /// `Timeout` when no chunk arrives within `read_timeout`, `Cancelled`
    /// when the token fires, or the underlying stream's error if a read
    /// fails. Malformed frames are absorbed here and never escape.
    pub async fn consume<S, F>(
        mut stream: S,
        cancel: &CancelToken,
        read_timeout: Duration,
        mut on_delta: F,
    ) -> AppResult<String>
    where
        S: Stream<Item = AppResult<Vec<u8>>> + Unpin,
        F: FnMut(&str),
    {
        let mut decoder = FrameDecoder::new();
        let mut accumulated = String::new();

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return Err(AppError::Cancelled),
                next = tokio::time::timeout(read_timeout, stream.next()) => next,
            };

            let chunk = match next {
                Err(_elapsed) => return Err(AppError::Timeout),
                Ok(None) => break,
                Ok(Some(Err(err))) => return Err(err),
                Ok(Some(Ok(chunk))) => chunk,
            };

            for frame in decoder.feed(&chunk) {
                match frame {
                    Frame::Delta(text) => {
                        accumulated.push_str(&text);
                        on_delta(&text);
                    }
                    Frame::Done => {
                        tracing::debug!(
                            "Stream complete: {} chars, {} frames skipped",
                            accumulated.len(),
                            decoder.skipped()
                        );
                        return Ok(accumulated);
                    }
                }
            }
        }

        tracing::debug!("Stream ended without [DONE]: {} chars", accumulated.len());

        Ok(accumulated)
    }
}
