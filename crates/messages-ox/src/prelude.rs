//! Common imports for consuming message responses.
//!
//! ```rust,no_run
//! use messages_ox::prelude::*;
//!
//! # async fn example(response: reqwest::Response) -> Result<(), MessagesError> {
//! let mut stream = MessageStream::from_response(response, StreamOptions::default()).await?;
//! while let Some(update) = stream.next_update().await? {
//!     if let StreamUpdate::TextDelta { text, .. } = update {
//!         print!("{text}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub use crate::{
    CancellationToken, ChatResponse, MessagesError, ProtocolError, StopReason, Usage,
    message::{
        BlockKind, CacheControl, Citation, ContentBlock, DocumentSource, ImageSource, Message,
        Role, TextBlock, ThinkingBlock,
    },
    stream::{MessageStream, StreamEvent, StreamOptions, StreamUpdate},
    tool::{Tool, ToolCall, ToolError, ToolFunction, ToolRegistry, ToolResult, ToolResultContent, ToolUse},
};
