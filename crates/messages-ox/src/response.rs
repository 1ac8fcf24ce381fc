use serde::{Deserialize, Serialize};
use serde_json::Value;

use messages_ox_common::FrameError;

use crate::{
    error::{MessagesError, parse_error_response},
    message::{ContentBlock, Message, Role, ThinkingBlock},
    tool::ToolUse,
    usage::Usage,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
    PauseTurn,
    Refusal,
    #[serde(other)]
    Unknown,
}

/// Code-execution container the response ran in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

fn message_type() -> String {
    "message".to_string()
}

/// One assembled assistant turn, whether streamed or decoded in one piece.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub id: String,
    #[serde(default = "message_type")]
    pub r#type: String,
    pub role: Role,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    pub model: String,
    #[serde(default)]
    pub stop_reason: Option<StopReason>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
    #[serde(default)]
    pub usage: Usage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,
}

impl ChatResponse {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Decodes the body of an already-sent, non-streaming response.
    pub async fn from_response(response: reqwest::Response) -> Result<Self, MessagesError> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(FrameError::from)?;
        if !status.is_success() {
            return Err(parse_error_response(status, &bytes));
        }
        Ok(Self::from_slice(&bytes)?)
    }

    pub fn text_content(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .map(|text| text.as_str())
            .collect()
    }

    /// All text blocks joined together.
    pub fn text(&self) -> String {
        self.text_content().concat()
    }

    pub fn tool_uses(&self) -> impl Iterator<Item = &ToolUse> {
        self.content.iter().filter_map(ContentBlock::as_tool_use)
    }

    pub fn has_tool_use(&self) -> bool {
        self.tool_uses().next().is_some()
    }

    pub fn thinking_blocks(&self) -> impl Iterator<Item = &ThinkingBlock> {
        self.content.iter().filter_map(ContentBlock::as_thinking)
    }

    pub fn thinking_content(&self) -> Vec<&str> {
        self.thinking_blocks()
            .map(|thinking| thinking.thinking.as_str())
            .collect()
    }

    pub fn has_thinking(&self) -> bool {
        self.thinking_blocks().next().is_some()
    }

    /// Turns the response into a message that can be appended to the
    /// conversation history.
    pub fn into_message(self) -> Message {
        Message::new(self.role, self.content)
    }
}

impl From<ChatResponse> for Message {
    fn from(response: ChatResponse) -> Self {
        response.into_message()
    }
}

impl std::fmt::Display for ChatResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut content_summary = Vec::new();

        let text_parts = self.text_content();
        if !text_parts.is_empty() {
            content_summary.push(format!("text: [{}]", text_parts.join(", ")));
        }

        let thinking_parts = self.thinking_content();
        if !thinking_parts.is_empty() {
            content_summary.push(format!("thinking: [{}]", thinking_parts.len()));
        }

        if self.has_tool_use() {
            content_summary.push("tools".to_string());
        }

        write!(
            f,
            "ChatResponse {{ id: {}, type: {}, role: {}, model: {}, content: {} }}",
            self.id,
            self.r#type,
            self.role,
            self.model,
            content_summary.join(", ")
        )
    }
}
