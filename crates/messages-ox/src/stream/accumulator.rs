use std::collections::BTreeMap;

use serde_json::Value;

use super::{
    event::{ContentBlockDelta, MessageDelta, StreamEvent},
    update::StreamUpdate,
};
use crate::{
    error::{MessagesError, ProtocolError},
    message::{ContentBlock, TextBlock, ThinkingBlock},
    response::ChatResponse,
    usage::Usage,
};

/// A block between its start and stop events.
#[derive(Debug, Clone)]
enum PartialBlock {
    Text(TextBlock),
    Thinking(ThinkingBlock),
    /// A tool invocation whose `input` arrives as raw JSON fragments.
    Json {
        shell: ContentBlock,
        buffer: String,
    },
    /// Arrives whole in its start event.
    Complete(ContentBlock),
}

impl PartialBlock {
    fn from_shell(shell: ContentBlock) -> Self {
        match shell {
            ContentBlock::Text(text) => Self::Text(text),
            ContentBlock::Thinking(thinking) => Self::Thinking(thinking),
            shell @ (ContentBlock::ToolUse(_)
            | ContentBlock::ServerToolUse(_)
            | ContentBlock::McpToolUse(_)) => Self::Json {
                shell,
                buffer: String::new(),
            },
            other => Self::Complete(other),
        }
    }

    fn kind(&self) -> crate::message::BlockKind {
        match self {
            Self::Text(_) => crate::message::BlockKind::Text,
            Self::Thinking(_) => crate::message::BlockKind::Thinking,
            Self::Json { shell, .. } | Self::Complete(shell) => shell.kind(),
        }
    }

    /// Applies `delta`, returning the fragment to surface, if any.
    fn apply(
        &mut self,
        index: usize,
        delta: ContentBlockDelta,
    ) -> Result<Option<StreamUpdate>, ProtocolError> {
        match (self, delta) {
            (Self::Text(block), ContentBlockDelta::TextDelta { text }) => {
                block.push_str(&text);
                Ok(Some(StreamUpdate::TextDelta { index, text }))
            }
            (Self::Text(block), ContentBlockDelta::CitationsDelta { citation }) => {
                block.citations.get_or_insert_with(Vec::new).push(citation);
                Ok(None)
            }
            (Self::Thinking(block), ContentBlockDelta::ThinkingDelta { thinking }) => {
                block.thinking.push_str(&thinking);
                Ok(Some(StreamUpdate::ThinkingDelta { index, thinking }))
            }
            (Self::Thinking(block), ContentBlockDelta::SignatureDelta { signature }) => {
                block
                    .signature
                    .get_or_insert_with(String::new)
                    .push_str(&signature);
                Ok(None)
            }
            (Self::Json { buffer, .. }, ContentBlockDelta::InputJsonDelta { partial_json }) => {
                buffer.push_str(&partial_json);
                Ok(None)
            }
            (_, delta @ ContentBlockDelta::Unknown(_)) => {
                log::debug!(
                    "Ignoring unrecognised `{}` delta for block {index}",
                    delta.type_name()
                );
                Ok(None)
            }
            (Self::Complete(block), delta) if block.is_unknown() => {
                log::debug!(
                    "Ignoring `{}` delta for unrecognised `{}` block {index}",
                    delta.type_name(),
                    block.type_name()
                );
                Ok(None)
            }
            (block, delta) => Err(ProtocolError::DeltaMismatch {
                index,
                delta: delta_name(&delta),
                block: block.kind(),
            }),
        }
    }

    fn finalize(self, index: usize) -> Result<ContentBlock, ProtocolError> {
        match self {
            Self::Text(text) => Ok(ContentBlock::Text(text)),
            Self::Thinking(thinking) => Ok(ContentBlock::Thinking(thinking)),
            Self::Json { mut shell, buffer } => {
                if !buffer.is_empty() {
                    let input: Value = serde_json::from_str(&buffer)
                        .map_err(|source| ProtocolError::MalformedToolInput { index, source })?;
                    if let Some(slot) = input_slot(&mut shell) {
                        *slot = input;
                    }
                }
                Ok(shell)
            }
            Self::Complete(block) => Ok(block),
        }
    }
}

fn input_slot(block: &mut ContentBlock) -> Option<&mut Value> {
    match block {
        ContentBlock::ToolUse(b) => Some(&mut b.input),
        ContentBlock::ServerToolUse(b) => Some(&mut b.input),
        ContentBlock::McpToolUse(b) => Some(&mut b.input),
        _ => None,
    }
}

fn delta_name(delta: &ContentBlockDelta) -> &'static str {
    match delta {
        ContentBlockDelta::TextDelta { .. } => "text_delta",
        ContentBlockDelta::InputJsonDelta { .. } => "input_json_delta",
        ContentBlockDelta::ThinkingDelta { .. } => "thinking_delta",
        ContentBlockDelta::SignatureDelta { .. } => "signature_delta",
        ContentBlockDelta::CitationsDelta { .. } => "citations_delta",
        ContentBlockDelta::Unknown(_) => "unknown",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingStart,
    Open,
    Closed,
}

/// Rebuilds one response from its ordered protocol events.
///
/// Feed every decoded event to [`apply`](Self::apply); each call yields at
/// most one [`StreamUpdate`]. Any error is terminal for the stream.
#[derive(Debug, Clone)]
pub struct MessageAccumulator {
    phase: Phase,
    response: Option<ChatResponse>,
    open: BTreeMap<usize, PartialBlock>,
}

impl Default for MessageAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageAccumulator {
    pub fn new() -> Self {
        Self {
            phase: Phase::AwaitingStart,
            response: None,
            open: BTreeMap::new(),
        }
    }

    pub fn apply(&mut self, event: StreamEvent) -> Result<Option<StreamUpdate>, MessagesError> {
        let kind = event.kind();
        log::trace!("Applying `{kind}` event");

        if let StreamEvent::Error { error } = event {
            self.phase = Phase::Closed;
            self.response = None;
            self.open.clear();
            return Err(MessagesError::Remote(error));
        }

        match self.phase {
            Phase::Closed => Err(ProtocolError::EventAfterStop {
                event: kind.into(),
            }
            .into()),
            Phase::AwaitingStart => match event {
                StreamEvent::MessageStart { message } => {
                    self.phase = Phase::Open;
                    self.response = Some(message.clone());
                    Ok(Some(StreamUpdate::Started(message)))
                }
                _ => Err(ProtocolError::MessageNotStarted {
                    event: kind.into(),
                }
                .into()),
            },
            Phase::Open => self.apply_open(event).map_err(Into::into),
        }
    }

    fn apply_open(&mut self, event: StreamEvent) -> Result<Option<StreamUpdate>, ProtocolError> {
        let Some(response) = self.response.as_mut() else {
            return Err(ProtocolError::MessageNotStarted {
                event: event.kind().into(),
            });
        };

        match event {
            StreamEvent::MessageStart { .. } => Err(ProtocolError::DuplicateMessageStart),
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => {
                if let Some(&open) = self.open.keys().next() {
                    return Err(ProtocolError::InterleavedBlocks { index, open });
                }
                let expected = response.content.len();
                if index != expected {
                    return Err(ProtocolError::UnexpectedBlockIndex {
                        expected,
                        got: index,
                    });
                }
                if content_block.is_unknown() {
                    log::debug!(
                        "Block {index} has unrecognised type `{}`",
                        content_block.type_name()
                    );
                }
                self.open.insert(index, PartialBlock::from_shell(content_block));
                Ok(None)
            }
            StreamEvent::ContentBlockDelta { index, delta } => self
                .open
                .get_mut(&index)
                .ok_or(ProtocolError::UnknownBlockIndex { index })?
                .apply(index, delta),
            StreamEvent::ContentBlockStop { index } => {
                let block = self
                    .open
                    .remove(&index)
                    .ok_or(ProtocolError::UnknownBlockIndex { index })?
                    .finalize(index)?;
                response.content.push(block.clone());
                Ok(Some(StreamUpdate::BlockCompleted { index, block }))
            }
            StreamEvent::MessageDelta { delta, usage } => {
                apply_message_delta(response, delta, usage);
                Ok(Some(StreamUpdate::Delta {
                    stop_reason: response.stop_reason,
                    stop_sequence: response.stop_sequence.clone(),
                    usage: response.usage.clone(),
                }))
            }
            StreamEvent::MessageStop => {
                if let Some(&index) = self.open.keys().next() {
                    return Err(ProtocolError::UnterminatedBlock { index });
                }
                self.phase = Phase::Closed;
                Ok(Some(StreamUpdate::Completed(response.clone())))
            }
            StreamEvent::Error { .. } => Ok(None),
        }
    }

    /// Signals end of input. Fails unless `message_stop` was seen.
    pub fn finish(&self) -> Result<(), ProtocolError> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(ProtocolError::IncompleteStream)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Closed && self.response.is_some()
    }

    /// The response as assembled so far. Open blocks are not included.
    pub fn response(&self) -> Option<&ChatResponse> {
        self.response.as_ref()
    }

    /// The final response, once `message_stop` was applied.
    pub fn into_response(self) -> Option<ChatResponse> {
        if self.is_complete() {
            self.response
        } else {
            None
        }
    }
}

fn apply_message_delta(response: &mut ChatResponse, delta: MessageDelta, usage: Option<Usage>) {
    if delta.stop_reason.is_some() {
        response.stop_reason = delta.stop_reason;
    }
    if delta.stop_sequence.is_some() {
        response.stop_sequence = delta.stop_sequence;
    }
    if let Some(usage) = usage {
        response.usage.merge(usage);
    }
}

/// Folds a full event sequence into the final response.
pub fn accumulate<I>(events: I) -> Result<ChatResponse, MessagesError>
where
    I: IntoIterator<Item = StreamEvent>,
{
    let mut accumulator = MessageAccumulator::new();
    for event in events {
        accumulator.apply(event)?;
    }
    accumulator.finish()?;
    accumulator
        .into_response()
        .ok_or_else(|| ProtocolError::IncompleteStream.into())
}
