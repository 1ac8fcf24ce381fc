use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::ErrorInfo,
    message::{Citation, ContentBlock},
    response::{ChatResponse, StopReason},
    usage::Usage,
};

/// Event names of the message stream protocol.
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
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    MessageStart,
    ContentBlockStart,
    ContentBlockDelta,
    ContentBlockStop,
    MessageDelta,
    MessageStop,
    Error,
}

impl EventKind {
    /// Every protocol event name, as fed to the frame filter.
    pub fn names() -> impl Iterator<Item = &'static str> {
        <Self as strum::IntoEnumIterator>::iter().map(Into::into)
    }
}

/// One decoded protocol event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Response shell with empty content and the initial usage report.
    MessageStart { message: ChatResponse },
    ContentBlockStart {
        index: usize,
        content_block: ContentBlock,
    },
    ContentBlockDelta {
        index: usize,
        delta: ContentBlockDelta,
    },
    ContentBlockStop { index: usize },
    MessageDelta {
        delta: MessageDelta,
        usage: Option<Usage>,
    },
    MessageStop,
    Error { error: ErrorInfo },
}

impl StreamEvent {
    /// True for events after which no further event is expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind(), EventKind::MessageStop | EventKind::Error)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::MessageStart { .. } => EventKind::MessageStart,
            Self::ContentBlockStart { .. } => EventKind::ContentBlockStart,
            Self::ContentBlockDelta { .. } => EventKind::ContentBlockDelta,
            Self::ContentBlockStop { .. } => EventKind::ContentBlockStop,
            Self::MessageDelta { .. } => EventKind::MessageDelta,
            Self::MessageStop => EventKind::MessageStop,
            Self::Error { .. } => EventKind::Error,
        }
    }
}

/// Incremental change to the block open at some index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlockDelta {
    TextDelta { text: String },
    /// Raw fragment of a tool input document; only meaningful once all
    /// fragments of the block are concatenated.
    InputJsonDelta { partial_json: String },
    ThinkingDelta { thinking: String },
    SignatureDelta { signature: String },
    CitationsDelta { citation: Citation },
    /// Delta kind this crate does not know, kept as sent.
    Unknown(Value),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    ThinkingDelta { thinking: String },
    SignatureDelta { signature: String },
    CitationsDelta { citation: Citation },
}

impl ContentBlockDelta {
    const KNOWN: [&'static str; 5] = [
        "text_delta",
        "input_json_delta",
        "thinking_delta",
        "signature_delta",
        "citations_delta",
    ];

    /// Decodes a delta object, selecting the shape by its `type` field.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let known = value
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|kind| Self::KNOWN.contains(&kind));
        if !known {
            return Ok(Self::Unknown(value));
        }

        Ok(match serde_json::from_value(value)? {
            KnownDelta::TextDelta { text } => Self::TextDelta { text },
            KnownDelta::InputJsonDelta { partial_json } => Self::InputJsonDelta { partial_json },
            KnownDelta::ThinkingDelta { thinking } => Self::ThinkingDelta { thinking },
            KnownDelta::SignatureDelta { signature } => Self::SignatureDelta { signature },
            KnownDelta::CitationsDelta { citation } => Self::CitationsDelta { citation },
        })
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::TextDelta { .. } => "text_delta",
            Self::InputJsonDelta { .. } => "input_json_delta",
            Self::ThinkingDelta { .. } => "thinking_delta",
            Self::SignatureDelta { .. } => "signature_delta",
            Self::CitationsDelta { .. } => "citations_delta",
            Self::Unknown(value) => value.get("type").and_then(Value::as_str).unwrap_or("unknown"),
        }
    }
}

impl<'de> Deserialize<'de> for ContentBlockDelta {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// Top-level fields changed by a `message_delta` event.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageDelta {
    #[serde(default)]
    pub stop_reason: Option<StopReason>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
}
