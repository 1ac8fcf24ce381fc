use futures_util::{Stream, stream::BoxStream};
use messages_ox_common::{Bytes, FrameError, FrameReader};
use tokio_util::sync::CancellationToken;

use super::{
    accumulator::MessageAccumulator, decoder::decode_event, event::EventKind,
    options::StreamOptions, update::StreamUpdate,
};
use crate::{
    error::{MessagesError, ProtocolError, parse_error_response},
    response::ChatResponse,
};

/// Pull loop from a byte source to [`StreamUpdate`]s.
///
/// Owns its frame reader and accumulator; nothing is shared between streams.
/// The only await point is the read from the byte source. After the first
/// error, or after cancellation, every further pull returns `Ok(None)`.
#[derive(Debug)]
pub struct MessageStream {
    frames: Option<FrameReader>,
    accumulator: MessageAccumulator,
    cancellation: Option<CancellationToken>,
}

impl MessageStream {
    pub fn new<S, E>(byte_stream: S, options: StreamOptions) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<FrameError>,
    {
        Self::from_frames(FrameReader::new(byte_stream), options)
    }

    /// Wraps an already-configured frame reader; the protocol event filter and
    /// the line limit from `options` are applied on top.
    pub fn from_frames(frames: FrameReader, options: StreamOptions) -> Self {
        let frames = frames
            .with_event_filter(EventKind::names())
            .with_max_line_bytes(options.max_line_bytes);

        Self {
            frames: Some(frames),
            accumulator: MessageAccumulator::new(),
            cancellation: options.cancellation,
        }
    }

    /// Streams the body of an already-sent response.
    ///
    /// A non-success status is read in full and reported as
    /// [`MessagesError::Remote`] (or [`MessagesError::UnexpectedResponse`]
    /// when the body is not an API error object).
    pub async fn from_response(
        response: reqwest::Response,
        options: StreamOptions,
    ) -> Result<Self, MessagesError> {
        let status = response.status();
        if !status.is_success() {
            let bytes = response.bytes().await.map_err(FrameError::from)?;
            return Err(parse_error_response(status, &bytes));
        }

        Ok(Self::from_frames(FrameReader::from_response(response), options))
    }

    /// Next progress update, or `None` once the stream ended cleanly or was
    /// cancelled.
    pub async fn next_update(&mut self) -> Result<Option<StreamUpdate>, MessagesError> {
        loop {
            let Some(frames) = self.frames.as_mut() else {
                return Ok(None);
            };

            let read = match &self.cancellation {
                Some(token) => tokio::select! {
                    biased;
                    () = token.cancelled() => None,
                    frame = frames.next_frame() => Some(frame),
                },
                None => Some(frames.next_frame().await),
            };

            let Some(read) = read else {
                log::debug!("Message stream cancelled, closing byte source");
                self.frames = None;
                return Ok(None);
            };

            let frame = match read {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    self.frames = None;
                    self.accumulator.finish()?;
                    return Ok(None);
                }
                Err(e) => return Err(self.fail(e.into())),
            };

            let event = match decode_event(&frame.event, &frame.data) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(e) => return Err(self.fail(e)),
            };

            match self.accumulator.apply(event) {
                Ok(Some(update)) => return Ok(Some(update)),
                Ok(None) => {}
                Err(e) => return Err(self.fail(e)),
            }
        }
    }

    fn fail(&mut self, error: MessagesError) -> MessagesError {
        log::debug!("Message stream failed: {error}");
        self.frames = None;
        error
    }

    /// Drives the stream to `message_stop` and returns the assembled response.
    ///
    /// Returns as soon as the response completes, without waiting for the
    /// byte source to close.
    pub async fn final_response(mut self) -> Result<ChatResponse, MessagesError> {
        while let Some(update) = self.next_update().await? {
            if let StreamUpdate::Completed(response) = update {
                return Ok(response);
            }
        }

        // cancelled, or the source ended without a message_stop
        Err(ProtocolError::IncompleteStream.into())
    }

    /// The response as assembled so far.
    pub fn response(&self) -> Option<&ChatResponse> {
        self.accumulator.response()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    pub fn into_stream(self) -> BoxStream<'static, Result<StreamUpdate, MessagesError>> {
        let mut this = self;
        Box::pin(async_stream::try_stream! {
            while let Some(update) = this.next_update().await? {
                yield update;
            }
        })
    }
}
