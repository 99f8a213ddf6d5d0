//! SSE decoding for streaming completions
//!
//! The endpoint answers with a server-sent event stream: one JSON-encoded
//! chunk per `data:` event, terminated by a `data: [DONE]` marker. The parser
//! accepts arbitrary byte fragmentation; events split across network reads
//! are reassembled before decoding.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;

use crate::error::VisionError;
use crate::types::chunks::ChatChunk;

/// End-of-stream marker used by OpenAI-compatible endpoints.
const DONE_MARKER: &str = "[DONE]";

/// Incremental SSE parser.
///
/// Feed raw bytes, get back complete `ChatChunk`s. Incomplete lines and
/// events are buffered between calls.
#[derive(Debug, Default)]
pub(crate) struct SseParser {
    buffer: String,
    event_data: String,
    done: bool,
}

impl SseParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// True once the `[DONE]` marker has been seen; later bytes are ignored.
    pub(crate) fn is_done(&self) -> bool {
        self.done
    }

    /// Consume a network read and return every chunk it completes.
    pub(crate) fn feed(&mut self, bytes: &[u8]) -> Result<Vec<ChatChunk>, VisionError> {
        if self.done {
            return Ok(Vec::new());
        }

        self.buffer.push_str(&String::from_utf8_lossy(bytes));

        let mut chunks = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line = self.buffer[..newline].trim_end_matches('\r').to_string();
            self.buffer.drain(..=newline);

            if let Some(chunk) = self.process_line(&line)? {
                chunks.push(chunk);
            }
            if self.done {
                break;
            }
        }

        Ok(chunks)
    }

    fn process_line(&mut self, line: &str) -> Result<Option<ChatChunk>, VisionError> {
        // Blank line terminates the current event.
        if line.is_empty() {
            return self.dispatch_event();
        }

        // Comment line.
        if line.starts_with(':') {
            return Ok(None);
        }

        if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            if !self.event_data.is_empty() {
                self.event_data.push('\n');
            }
            self.event_data.push_str(value);
        }
        // Other SSE fields (event:, id:, retry:) carry nothing we consume.

        Ok(None)
    }

    fn dispatch_event(&mut self) -> Result<Option<ChatChunk>, VisionError> {
        if self.event_data.is_empty() {
            return Ok(None);
        }

        let data = std::mem::take(&mut self.event_data);

        if data.trim() == DONE_MARKER {
            self.done = true;
            return Ok(None);
        }

        let chunk = serde_json::from_str::<ChatChunk>(&data).map_err(|e| {
            VisionError::response_parsing(format!("invalid SSE chunk: {e}"))
        })?;

        Ok(Some(chunk))
    }
}

/// Lazy, single-pass, forward-only sequence of completion chunks.
///
/// Wraps the response byte stream; not restartable — retrying means issuing
/// a new request. Dropping it releases the underlying connection.
pub struct CompletionStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    parser: SseParser,
    buffered: VecDeque<ChatChunk>,
    finished: bool,
}

impl CompletionStream {
    pub(crate) fn new(
        stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(stream),
            parser: SseParser::new(),
            buffered: VecDeque::new(),
            finished: false,
        }
    }
}

impl Stream for CompletionStream {
    type Item = Result<ChatChunk, VisionError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(chunk) = this.buffered.pop_front() {
                return Poll::Ready(Some(Ok(chunk)));
            }

            if this.finished {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => match this.parser.feed(&bytes) {
                    Ok(chunks) => {
                        this.buffered.extend(chunks);
                        if this.parser.is_done() {
                            this.finished = true;
                        }
                    }
                    Err(e) => {
                        this.finished = true;
                        return Poll::Ready(Some(Err(e)));
                    }
                },
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(VisionError::network(format!(
                        "stream interrupted: {e}"
                    )))));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
