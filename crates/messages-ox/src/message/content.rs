use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::Value;

use super::{
    citation::{CacheControl, Citation, CitationsConfig},
    server_tool::{
        BashCodeExecutionToolResultBlock, CodeExecutionToolResultBlock, ContainerUploadBlock,
        McpToolResultBlock, McpToolUseBlock, ServerToolUseBlock,
        TextEditorCodeExecutionToolResultBlock, WebFetchToolResultBlock, WebSearchToolResultBlock,
    },
    source::{DocumentSource, ImageSource},
};
use crate::tool::{ToolResult, ToolUse};

#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

impl TextBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn push_str(&mut self, string: &str) {
        self.text.push_str(string);
    }
}

impl From<String> for TextBlock {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for TextBlock {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for TextBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ImageBlock {
    pub source: ImageSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

impl ImageBlock {
    pub fn new(source: ImageSource) -> Self {
        Self {
            source,
            cache_control: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DocumentBlock {
    pub source: DocumentSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<CitationsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

impl DocumentBlock {
    pub fn new(source: DocumentSource) -> Self {
        Self {
            source,
            title: None,
            context: None,
            citations: None,
            cache_control: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SearchResultBlock {
    pub source: String,
    pub title: String,
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<CitationsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

/// Chain-of-thought emitted by the model. The signature is opaque and must be
/// sent back unchanged.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ThinkingBlock {
    pub thinking: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl ThinkingBlock {
    pub fn new(thinking: impl Into<String>) -> Self {
        Self {
            thinking: thinking.into(),
            signature: None,
        }
    }

    pub fn with_signature(thinking: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            thinking: thinking.into(),
            signature: Some(signature.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RedactedThinkingBlock {
    pub data: String,
}

/// A block whose discriminator is not known to this crate. The original JSON
/// object is kept so the block re-encodes byte-for-byte equivalent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBlock {
    pub kind: String,
    pub raw: Value,
}

/// Serializes a payload with its discriminator in front of its own fields.
#[derive(Serialize)]
pub(crate) struct Tagged<'a, T> {
    #[serde(rename = "type")]
    pub(crate) kind: &'a str,
    #[serde(flatten)]
    pub(crate) inner: &'a T,
}

/// Declares the content block union together with its discriminator table.
///
/// Every variant gets a `BlockKind`, a decode arm keyed by its wire tag and an
/// encode arm that writes the tag back. Anything not listed here decodes to
/// `ContentBlock::Unknown`.
macro_rules! content_blocks {
    ($( $(#[$meta:meta])* $variant:ident($payload:ty) => $tag:literal, )+) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum ContentBlock {
            $( $(#[$meta])* $variant($payload), )+
            Unknown(UnknownBlock),
        }

        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            strum::Display,
            strum::EnumString,
            strum::IntoStaticStr,
        )]
        pub enum BlockKind {
            $( #[strum(serialize = $tag)] $variant, )+
            #[strum(serialize = "unknown")]
            Unknown,
        }

        impl ContentBlock {
            pub fn kind(&self) -> BlockKind {
                match self {
                    $( Self::$variant(_) => BlockKind::$variant, )+
                    Self::Unknown(_) => BlockKind::Unknown,
                }
            }

            /// Decodes one block from its JSON object.
            ///
            /// A recognised discriminator with a mismatching shape is an error;
            /// an unrecognised discriminator yields [`ContentBlock::Unknown`].
            pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
                let Some(kind) = value.get("type").and_then(Value::as_str) else {
                    return Err(de::Error::missing_field("type"));
                };

                match kind {
                    $( $tag => serde_json::from_value::<$payload>(value).map(Self::$variant), )+
                    other => {
                        log::debug!("Decoding unrecognised content block type `{other}` as unknown");
                        Ok(Self::Unknown(UnknownBlock {
                            kind: other.to_string(),
                            raw: value,
                        }))
                    }
                }
            }
        }

        impl Serialize for ContentBlock {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match self {
                    $( Self::$variant(inner) => Tagged { kind: $tag, inner }.serialize(serializer), )+
                    Self::Unknown(block) => block.raw.serialize(serializer),
                }
            }
        }

        $(
            impl From<$payload> for ContentBlock {
                fn from(block: $payload) -> Self {
                    Self::$variant(block)
                }
            }
        )+
    };
}

content_blocks! {
    Text(TextBlock) => "text",
    Image(ImageBlock) => "image",
    Document(DocumentBlock) => "document",
    SearchResult(SearchResultBlock) => "search_result",
    ToolUse(ToolUse) => "tool_use",
    ToolResult(ToolResult) => "tool_result",
    Thinking(ThinkingBlock) => "thinking",
    RedactedThinking(RedactedThinkingBlock) => "redacted_thinking",
    /// A tool the endpoint runs itself (web search, code execution, ...).
    ServerToolUse(ServerToolUseBlock) => "server_tool_use",
    McpToolUse(McpToolUseBlock) => "mcp_tool_use",
    McpToolResult(McpToolResultBlock) => "mcp_tool_result",
    WebSearchToolResult(WebSearchToolResultBlock) => "web_search_tool_result",
    WebFetchToolResult(WebFetchToolResultBlock) => "web_fetch_tool_result",
    CodeExecutionToolResult(CodeExecutionToolResultBlock) => "code_execution_tool_result",
    BashCodeExecutionToolResult(BashCodeExecutionToolResultBlock) => "bash_code_execution_tool_result",
    TextEditorCodeExecutionToolResult(TextEditorCodeExecutionToolResultBlock) => "text_editor_code_execution_tool_result",
    ContainerUpload(ContainerUploadBlock) => "container_upload",
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

impl ContentBlock {
    pub fn text<T: Into<String>>(text: T) -> Self {
        Self::Text(TextBlock::new(text))
    }

    pub fn image(source: ImageSource) -> Self {
        Self::Image(ImageBlock::new(source))
    }

    pub fn document(source: DocumentSource) -> Self {
        Self::Document(DocumentBlock::new(source))
    }

    /// The wire discriminator, including the raw one of an unknown block.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Unknown(block) => &block.kind,
            other => other.kind().into(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    pub fn as_text(&self) -> Option<&TextBlock> {
        if let Self::Text(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_tool_use(&self) -> Option<&ToolUse> {
        if let Self::ToolUse(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_tool_result(&self) -> Option<&ToolResult> {
        if let Self::ToolResult(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn as_thinking(&self) -> Option<&ThinkingBlock> {
        if let Self::Thinking(v) = self {
            Some(v)
        } else {
            None
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl From<&str> for ContentBlock {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for ContentBlock {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl fmt::Display for ContentBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => fmt::Display::fmt(text, f),
            Self::Image(image) => write!(f, "Image: {}", image.source),
            Self::Document(document) => write!(f, "Document: {}", document.source),
            Self::ToolUse(tool_use) => fmt::Display::fmt(tool_use, f),
            Self::ToolResult(tool_result) => fmt::Display::fmt(tool_result, f),
            Self::Thinking(thinking) => write!(f, "Thinking: {}", thinking.thinking),
            other => write!(f, "[{}]", other.type_name()),
        }
    }
}
