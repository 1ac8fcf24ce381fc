pub mod error;
pub mod registry;

pub use error::ToolError;
pub use registry::{ToolCall, ToolFunction, ToolRegistry};

use schemars::{JsonSchema, generate::SchemaSettings};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::message::{CacheControl, ContentBlock};

/// Definition of a caller-side tool as advertised to the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({"type": "object"}),
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }
}

/// Request from the model to run a caller-side tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolUse {
    pub id: String,
    pub name: String,
    pub input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

impl ToolUse {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
            cache_control: None,
        }
    }
}

impl fmt::Display for ToolUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ToolUse(id: {}, name: {})", self.id, self.name)
    }
}

/// Body of a `tool_result`: either a bare string or nested blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ToolResultContent {
    String(String),
    Blocks(Vec<ContentBlock>),
}

impl ToolResultContent {
    /// Text carried by this content, joining text blocks when nested.
    pub fn text(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Blocks(blocks) => blocks
                .iter()
                .filter_map(ContentBlock::as_text)
                .map(|t| t.text.as_str())
                .collect(),
        }
    }
}

impl From<String> for ToolResultContent {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<ContentBlock>> for ToolResultContent {
    fn from(value: Vec<ContentBlock>) -> Self {
        Self::Blocks(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolResult {
    pub tool_use_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ToolResultContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

impl ToolResult {
    pub fn new(tool_use_id: impl Into<String>, content: impl Into<ToolResultContent>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            content: Some(content.into()),
            is_error: None,
            cache_control: None,
        }
    }

    pub fn text(tool_use_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(tool_use_id, ToolResultContent::String(text.into()))
    }

    pub fn error(tool_use_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            is_error: Some(true),
            ..Self::text(tool_use_id, error)
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}

impl fmt::Display for ToolResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ToolResult(id: {})", self.tool_use_id)
    }
}

/// Generates a JSON schema for the given type using schemars.
///
/// Subschemas are inlined and the `$schema`/`title` keys dropped, which is
/// the shape tool definitions expect.
#[must_use]
pub fn schema_for_type<T: JsonSchema>() -> Value {
    let settings = SchemaSettings::draft2020_12().with(|s| {
        s.inline_subschemas = true;
        s.meta_schema = None;
    });
    let generator = schemars::generate::SchemaGenerator::new(settings);
    let mut schema_value = generator.into_root_schema_for::<T>().to_value();

    if let Some(obj) = schema_value.as_object_mut() {
        obj.remove("title");
    }

    schema_value
}
