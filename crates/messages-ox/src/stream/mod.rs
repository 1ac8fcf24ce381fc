//! Streaming reconstruction: frames are decoded into [`StreamEvent`]s, which
//! the [`MessageAccumulator`] folds into a [`ChatResponse`](crate::ChatResponse)
//! while reporting [`StreamUpdate`]s.

pub mod accumulator;
pub mod decoder;
pub mod event;
pub mod message_stream;
pub mod options;
pub mod update;

pub use accumulator::{MessageAccumulator, accumulate};
pub use decoder::decode_event;
pub use event::{ContentBlockDelta, EventKind, MessageDelta, StreamEvent};
pub use message_stream::MessageStream;
pub use options::{DEFAULT_MAX_LINE_BYTES, StreamOptions};
pub use update::StreamUpdate;
