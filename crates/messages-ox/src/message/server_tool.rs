//! Results of tools the remote endpoint executes on its own side (web search,
//! web fetch, code execution) and the MCP connector blocks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ContentBlock;
use crate::tool::ToolResultContent;

/// `error_code` reported by a `*_tool_result_error` payload.
///
/// Codes this crate does not know are kept as sent in
/// [`ToolResultErrorCode::Unknown`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolResultErrorCode {
    InvalidToolInput,
    Unavailable,
    MaxUsesExceeded,
    TooManyRequests,
    QueryTooLong,
    UrlTooLong,
    UrlNotAllowed,
    UrlNotAccessible,
    UnsupportedContentType,
    ExecutionTimeExceeded,
    ContainerExpired,
    OutputFileTooLarge,
    FileNotFound,
    #[serde(untagged)]
    Unknown(String),
}

impl ToolResultErrorCode {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

/// Error payload shared by every server tool result kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolResultError {
    pub error_code: ToolResultErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerToolUseBlock {
    pub id: String,
    pub name: String,
    pub input: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct McpToolUseBlock {
    pub id: String,
    pub name: String,
    pub server_name: String,
    pub input: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct McpToolResultBlock {
    pub tool_use_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ToolResultContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

// Web search

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebSearchToolResultBlock {
    pub tool_use_id: String,
    pub content: WebSearchToolResultContent,
}

/// Either the list of hits or an error object; the two differ in JSON shape
/// (array vs object) so no tag is needed to tell them apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum WebSearchToolResultContent {
    Results(Vec<WebSearchResult>),
    Error(WebSearchToolResultError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebSearchResult {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub url: String,
    pub encrypted_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_age: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebSearchToolResultError {
    #[serde(rename = "type")]
    pub kind: String,
    pub error_code: ToolResultErrorCode,
}

// Web fetch

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebFetchToolResultBlock {
    pub tool_use_id: String,
    pub content: WebFetchToolResultContent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WebFetchToolResultContent {
    WebFetchResult(WebFetchResult),
    WebFetchToolResultError(ToolResultError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebFetchResult {
    pub url: String,
    /// The fetched page, as a `document` block.
    pub content: Box<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieved_at: Option<String>,
}

// Code execution

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeExecutionOutput {
    #[serde(rename = "type")]
    pub kind: String,
    pub file_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub return_code: i32,
    #[serde(default)]
    pub content: Vec<CodeExecutionOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeExecutionToolResultBlock {
    pub tool_use_id: String,
    pub content: CodeExecutionToolResultContent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CodeExecutionToolResultContent {
    CodeExecutionResult(CodeExecutionResult),
    CodeExecutionToolResultError(ToolResultError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BashCodeExecutionToolResultBlock {
    pub tool_use_id: String,
    pub content: BashCodeExecutionToolResultContent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BashCodeExecutionToolResultContent {
    BashCodeExecutionResult(CodeExecutionResult),
    BashCodeExecutionToolResultError(ToolResultError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextEditorCodeExecutionToolResultBlock {
    pub tool_use_id: String,
    pub content: TextEditorCodeExecutionToolResultContent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextEditorCodeExecutionToolResultContent {
    TextEditorCodeExecutionViewResult(TextEditorViewResult),
    TextEditorCodeExecutionCreateResult(TextEditorCreateResult),
    TextEditorCodeExecutionStrReplaceResult(TextEditorStrReplaceResult),
    TextEditorCodeExecutionToolResultError(ToolResultError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextEditorViewResult {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_lines: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_lines: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextEditorCreateResult {
    pub is_file_update: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextEditorStrReplaceResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_lines: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_lines: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_start: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerUploadBlock {
    pub file_id: String,
}
