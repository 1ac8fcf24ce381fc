pub mod citation;
pub mod content;
#[allow(clippy::module_inception)]
pub mod message;
pub mod server_tool;
pub mod source;

pub use crate::tool::{ToolResult, ToolResultContent, ToolUse};
pub use citation::{CacheControl, Citation, CitationsConfig};
pub use content::{
    BlockKind, ContentBlock, DocumentBlock, ImageBlock, RedactedThinkingBlock, SearchResultBlock,
    TextBlock, ThinkingBlock, UnknownBlock,
};
pub use message::{Message, Role};
pub use server_tool::{
    BashCodeExecutionToolResultBlock, CodeExecutionToolResultBlock, ContainerUploadBlock,
    McpToolResultBlock, McpToolUseBlock, ServerToolUseBlock, TextEditorCodeExecutionToolResultBlock,
    ToolResultError, ToolResultErrorCode, WebFetchToolResultBlock, WebSearchToolResultBlock,
};
pub use source::{DocumentSource, ImageSource};
