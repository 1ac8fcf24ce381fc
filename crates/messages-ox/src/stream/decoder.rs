//! Frame payload → [`StreamEvent`].

use serde::{Deserialize, de::DeserializeOwned};

use super::event::{ContentBlockDelta, EventKind, MessageDelta, StreamEvent};
use crate::{
    error::{ErrorInfo, MessagesError},
    message::ContentBlock,
    response::ChatResponse,
    usage::Usage,
};

#[derive(Deserialize)]
struct MessageStartPayload {
    message: ChatResponse,
}

#[derive(Deserialize)]
struct BlockStartPayload {
    index: usize,
    content_block: ContentBlock,
}

#[derive(Deserialize)]
struct BlockDeltaPayload {
    index: usize,
    delta: ContentBlockDelta,
}

#[derive(Deserialize)]
struct BlockStopPayload {
    index: usize,
}

#[derive(Deserialize)]
struct MessageDeltaPayload {
    delta: MessageDelta,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ErrorPayload {
    error: ErrorInfo,
}

/// Decodes one named frame.
///
/// Returns `Ok(None)` for event names outside the protocol (`ping` and
/// anything added later), which the caller skips.
pub fn decode_event(event: &str, data: &str) -> Result<Option<StreamEvent>, MessagesError> {
    let Ok(kind) = event.parse::<EventKind>() else {
        log::trace!("Skipping `{event}` event");
        return Ok(None);
    };

    let decoded = match kind {
        EventKind::MessageStart => {
            let p: MessageStartPayload = parse(kind, data)?;
            StreamEvent::MessageStart { message: p.message }
        }
        EventKind::ContentBlockStart => {
            let p: BlockStartPayload = parse(kind, data)?;
            StreamEvent::ContentBlockStart {
                index: p.index,
                content_block: p.content_block,
            }
        }
        EventKind::ContentBlockDelta => {
            let p: BlockDeltaPayload = parse(kind, data)?;
            StreamEvent::ContentBlockDelta {
                index: p.index,
                delta: p.delta,
            }
        }
        EventKind::ContentBlockStop => {
            let p: BlockStopPayload = parse(kind, data)?;
            StreamEvent::ContentBlockStop { index: p.index }
        }
        EventKind::MessageDelta => {
            let p: MessageDeltaPayload = parse(kind, data)?;
            StreamEvent::MessageDelta {
                delta: p.delta,
                usage: p.usage,
            }
        }
        EventKind::MessageStop => {
            // no fields, but a present body must still be JSON
            if !data.trim().is_empty() {
                parse::<serde::de::IgnoredAny>(kind, data)?;
            }
            StreamEvent::MessageStop
        }
        EventKind::Error => {
            let p: ErrorPayload = parse(kind, data)?;
            StreamEvent::Error { error: p.error }
        }
    };

    Ok(Some(decoded))
}

fn parse<T: DeserializeOwned>(kind: EventKind, data: &str) -> Result<T, MessagesError> {
    serde_json::from_str(data).map_err(|source| MessagesError::Decode {
        event: kind.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::TextBlock;

    #[test]
    fn test_unknown_event_is_skipped() {
        assert!(decode_event("ping", r#"{"type":"ping"}"#).unwrap().is_none());
        assert!(decode_event("telemetry", "not json").unwrap().is_none());
    }

    #[test]
    fn test_block_start() {
        let event = decode_event(
            "content_block_start",
            r#"{"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(
            event,
            StreamEvent::ContentBlockStart {
                index: 0,
                content_block: ContentBlock::Text(TextBlock::new(""))
            }
        );
    }

    #[test]
    fn test_message_delta_with_usage() {
        let event = decode_event(
            "message_delta",
            r#"{"type":"message_delta","delta":{"stop_reason":"end_turn","stop_sequence":null},"usage":{"output_tokens":15}}"#,
        )
        .unwrap()
        .unwrap();

        match event {
            StreamEvent::MessageDelta { delta, usage } => {
                assert_eq!(delta.stop_reason, Some(crate::response::StopReason::EndTurn));
                assert_eq!(usage.unwrap().output_tokens, Some(15));
            }
            other => panic!("Expected message_delta, got {other:?}"),
        }
    }

    #[test]
    fn test_error_event() {
        let event = decode_event(
            "error",
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            event,
            StreamEvent::Error {
                error: ErrorInfo::new("overloaded_error", "Overloaded")
            }
        );
    }

    #[test]
    fn test_malformed_payload_names_event() {
        let error = decode_event("content_block_delta", r#"{"index":"zero"}"#).unwrap_err();
        assert!(matches!(
            error,
            MessagesError::Decode { ref event, .. } if event == "content_block_delta"
        ));
    }

    #[test]
    fn test_message_stop_with_and_without_body() {
        assert_eq!(
            decode_event("message_stop", r#"{"type":"message_stop"}"#).unwrap(),
            Some(StreamEvent::MessageStop)
        );
        assert_eq!(
            decode_event("message_stop", "").unwrap(),
            Some(StreamEvent::MessageStop)
        );
        assert!(decode_event("message_stop", "{").is_err());
    }
}
