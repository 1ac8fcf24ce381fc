use std::{collections::VecDeque, pin::Pin};

use bytes::Bytes;
use futures_util::{Stream, StreamExt, stream::BoxStream};

use crate::error::FrameError;

/// Event name used when a frame carries `data:` but no `event:` line.
pub const DEFAULT_EVENT: &str = "message";

/// One dispatched Server-Sent-Events frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Value of the `event:` field (or [`DEFAULT_EVENT`]).
    pub event: String,
    /// Value of the last `data:` field seen before the blank line.
    pub data: String,
}

impl Frame {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }
}

/// Synchronous, line-oriented SSE framing.
///
/// Bytes are pushed in arbitrary chunks; complete frames come out. Lines are
/// split on `\n` with an optional trailing `\r`, so a chunk boundary may fall
/// anywhere, including inside a multi-byte character.
#[derive(Debug, Default, Clone)]
pub struct FrameParser {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no `\n`.
    scanned: usize,
    event: Option<String>,
    data: Option<String>,
    accepted: Option<Vec<String>>,
    max_line_bytes: Option<usize>,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only frames whose event name is in `events` are emitted.
    #[must_use]
    pub fn with_event_filter<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepted = Some(events.into_iter().map(Into::into).collect());
        self
    }

    /// Fails with [`FrameError::LineTooLong`] once a line, terminated or
    /// still buffered, grows past `limit` bytes.
    #[must_use]
    pub fn with_max_line_bytes(mut self, limit: usize) -> Self {
        self.max_line_bytes = Some(limit);
        self
    }

    /// Feeds a chunk of bytes and returns every frame it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Frame>, FrameError> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') {
            let pos = self.scanned + offset;
            self.scanned = 0;
            let mut line_bytes = self.buffer.drain(..=pos).collect::<Vec<u8>>();
            line_bytes.pop();
            if line_bytes.last() == Some(&b'\r') {
                line_bytes.pop();
            }
            self.check_line_length(line_bytes.len())?;
            let line = String::from_utf8(line_bytes)?;

            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }

        self.scanned = self.buffer.len();
        self.check_line_length(self.buffer.len())?;

        Ok(frames)
    }

    fn check_line_length(&self, len: usize) -> Result<(), FrameError> {
        match self.max_line_bytes {
            Some(limit) if len > limit => Err(FrameError::LineTooLong { limit }),
            _ => Ok(()),
        }
    }

    /// Signals end of input. A pending frame that never saw its blank-line
    /// terminator is discarded.
    pub fn finish(&mut self) {
        if self.event.is_some() || self.data.is_some() || !self.buffer.is_empty() {
            log::debug!(
                "Discarding unterminated SSE frame (event: {:?}, {} buffered bytes)",
                self.event,
                self.buffer.len()
            );
        }
        self.buffer.clear();
        self.scanned = 0;
        self.event = None;
        self.data = None;
    }

    /// Returns true if `event` passes the configured filter.
    pub fn accepts(&self, event: &str) -> bool {
        self.accepted
            .as_ref()
            .is_none_or(|accepted| accepted.iter().any(|name| name == event))
    }

    fn process_line(&mut self, line: &str) -> Option<Frame> {
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
            "data" => self.data = Some(value.to_string()),
            // id, retry and unknown fields carry nothing we use
            _ => {}
        }

        None
    }

    fn dispatch(&mut self) -> Option<Frame> {
        if self.event.is_none() && self.data.is_none() {
            return None;
        }

        let frame = Frame {
            event: self
                .event
                .take()
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data: self.data.take().unwrap_or_default(),
        };

        if self.accepts(&frame.event) {
            Some(frame)
        } else {
            log::trace!("Ignoring SSE frame with event `{}`", frame.event);
            None
        }
    }
}

/// Pulls frames out of an asynchronous byte source.
pub struct FrameReader {
    byte_stream: Pin<Box<dyn Stream<Item = Result<Bytes, FrameError>> + Send>>,
    parser: FrameParser,
    ready: VecDeque<Frame>,
    finished: bool,
}

impl std::fmt::Debug for FrameReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReader")
            .field("parser", &self.parser)
            .field("ready", &self.ready.len())
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl FrameReader {
    pub fn new<S, E>(byte_stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<FrameError>,
    {
        Self {
            byte_stream: Box::pin(byte_stream.map(|chunk| chunk.map_err(Into::into))),
            parser: FrameParser::new(),
            ready: VecDeque::new(),
            finished: false,
        }
    }

    /// Reads the body of an already-sent response.
    pub fn from_response(response: reqwest::Response) -> Self {
        Self::new(response.bytes_stream())
    }

    #[must_use]
    pub fn with_event_filter<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parser = self.parser.with_event_filter(events);
        self
    }

    #[must_use]
    pub fn with_max_line_bytes(mut self, limit: usize) -> Self {
        self.parser = self.parser.with_max_line_bytes(limit);
        self
    }

    /// Get the next frame from the stream.
    ///
    /// Returns `Ok(None)` once the byte source is exhausted. The only await
    /// point is the read from the byte source, so dropping the returned
    /// future loses no buffered data.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return Ok(Some(frame));
            }

            if self.finished {
                return Ok(None);
            }

            if let Some(chunk) = self.byte_stream.next().await {
                let chunk = chunk?;
                self.ready.extend(self.parser.push(&chunk)?);
            } else {
                self.parser.finish();
                self.finished = true;
            }
        }
    }

    pub fn into_stream(mut self) -> BoxStream<'static, Result<Frame, FrameError>> {
        Box::pin(async_stream::try_stream! {
            while let Some(frame) = self.next_frame().await? {
                yield frame;
            }
        })
    }
}

/// Frames a complete text body in one go, without any event filter.
pub fn parse_frames(body: &str) -> Result<Vec<Frame>, FrameError> {
    let mut parser = FrameParser::new();
    let frames = parser.push(body.as_bytes())?;
    parser.finish();
    Ok(frames)
}
