#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items
)]

//! Reconstruction of streamed and non-streamed message responses.
//!
//! A raw Server-Sent-Events byte source goes in through [`MessageStream`];
//! typed [`StreamUpdate`]s and a final [`ChatResponse`] come out. The same
//! [`ContentBlock`] decode rules back [`ChatResponse::from_json`], so both
//! paths agree on the result. Finished `tool_use` blocks can be bound to
//! caller-side tools with a [`ToolRegistry`].

pub mod error;
pub mod message;
pub mod prelude;
pub mod response;
pub mod stream;
pub mod tool;
pub mod usage;

// Re-export main types
pub use error::{ErrorInfo, ErrorKind, MessagesError, ProtocolError};
pub use message::{ContentBlock, Message, Role};
pub use response::{ChatResponse, StopReason};
pub use stream::{MessageStream, StreamEvent, StreamOptions, StreamUpdate};
pub use tool::{ToolCall, ToolError, ToolFunction, ToolRegistry};
pub use usage::Usage;

pub use messages_ox_common::{Frame, FrameError, FrameReader};
pub use tokio_util::sync::CancellationToken;
