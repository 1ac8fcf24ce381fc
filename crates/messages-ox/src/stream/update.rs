use crate::{
    message::ContentBlock,
    response::{ChatResponse, StopReason},
    usage::Usage,
};

/// Progress reported to the caller while a response streams in.
///
/// Blocks only ever appear whole, in [`StreamUpdate::BlockCompleted`]; tool
/// input fragments are never surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamUpdate {
    /// The response shell, before any content block.
    Started(ChatResponse),
    TextDelta { index: usize, text: String },
    ThinkingDelta { index: usize, thinking: String },
    BlockCompleted { index: usize, block: ContentBlock },
    /// Top-level fields changed; `usage` is the merged total so far.
    Delta {
        stop_reason: Option<StopReason>,
        stop_sequence: Option<String>,
        usage: Usage,
    },
    Completed(ChatResponse),
}

impl StreamUpdate {
    pub fn as_text_delta(&self) -> Option<&str> {
        match self {
            Self::TextDelta { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}
