use messages_ox_common::FrameError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::BlockKind;

/// Categorizes errors for retry logic and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rate limiting - should retry with backoff
    RateLimit,
    /// Authentication/authorization issues - should not retry
    Auth,
    /// Invalid request format - should not retry
    InvalidRequest,
    /// Server overloaded - may retry
    ServerOverloaded,
    /// Network/connection issues - may retry
    Network,
    /// API temporarily unavailable - may retry
    ServiceUnavailable,
    /// The event stream broke the message protocol
    Protocol,
    /// Unknown/other errors
    Other,
}

/// Error object reported by the endpoint, either in an `error` stream event
/// or in the body of a failed HTTP response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorInfo {
    pub r#type: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(r#type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            r#type: r#type.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ErrorInfo,
}

/// Violations of the message event protocol. All of them end the stream.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Received `{event}` before `message_start`")]
    MessageNotStarted { event: &'static str },

    #[error("Received a second `message_start`")]
    DuplicateMessageStart,

    #[error("Block {index} started while block {open} is still open")]
    InterleavedBlocks { index: usize, open: usize },

    #[error("Block started at index {got}, expected {expected}")]
    UnexpectedBlockIndex { expected: usize, got: usize },

    #[error("No open block at index {index}")]
    UnknownBlockIndex { index: usize },

    #[error("`{delta}` delta sent to a `{block}` block at index {index}")]
    DeltaMismatch {
        index: usize,
        delta: &'static str,
        block: BlockKind,
    },

    #[error("Tool input of block {index} is not valid JSON")]
    MalformedToolInput {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Message stopped while block {index} is still open")]
    UnterminatedBlock { index: usize },

    #[error("Stream ended before `message_stop`")]
    IncompleteStream,

    #[error("Received `{event}` after `message_stop`")]
    EventAfterStop { event: &'static str },
}

#[derive(Debug, Error)]
pub enum MessagesError {
    /// Reading or framing the byte source failed
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The endpoint reported an error
    #[error("Remote error ({}): {}", .0.r#type, .0.message)]
    Remote(ErrorInfo),

    /// The event sequence broke the protocol
    #[error("Protocol violation: {0}")]
    Protocol(#[from] ProtocolError),

    /// A recognised event carried a payload of the wrong shape
    #[error("Failed to decode `{event}` event")]
    Decode {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    /// A non-success response whose body is not an API error object
    #[error("Unexpected response from API (HTTP {status}): {body}")]
    UnexpectedResponse { status: u16, body: String },
}

impl From<ErrorInfo> for MessagesError {
    fn from(error: ErrorInfo) -> Self {
        Self::Remote(error)
    }
}

impl MessagesError {
    /// Returns the error kind for categorizing errors in retry logic
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Remote(info) => match info.r#type.as_str() {
                "rate_limit_error" => ErrorKind::RateLimit,
                "authentication_error" | "permission_error" => ErrorKind::Auth,
                "invalid_request_error" | "not_found_error" | "request_too_large" => {
                    ErrorKind::InvalidRequest
                }
                "overloaded_error" => ErrorKind::ServerOverloaded,
                "api_error" => ErrorKind::ServiceUnavailable,
                _ => ErrorKind::Other,
            },
            Self::Frame(FrameError::Http(e)) => {
                if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
                    ErrorKind::Network
                } else {
                    ErrorKind::Other
                }
            }
            Self::Frame(FrameError::Io(_) | FrameError::Transport(_)) => ErrorKind::Network,
            Self::Frame(FrameError::Utf8(_) | FrameError::LineTooLong { .. })
            | Self::Protocol(_)
            | Self::Decode { .. } => ErrorKind::Protocol,
            Self::UnexpectedResponse { status, .. } => match status {
                429 => ErrorKind::RateLimit,
                401 | 403 => ErrorKind::Auth,
                400 | 404 | 413 => ErrorKind::InvalidRequest,
                529 => ErrorKind::ServerOverloaded,
                500..=599 => ErrorKind::ServiceUnavailable,
                _ => ErrorKind::Other,
            },
            Self::Serde(_) => ErrorKind::Other,
        }
    }

    /// Returns true if this error should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RateLimit
                | ErrorKind::ServerOverloaded
                | ErrorKind::Network
                | ErrorKind::ServiceUnavailable
        )
    }

    /// The remote error object, if this error came from the endpoint.
    pub fn remote(&self) -> Option<&ErrorInfo> {
        match self {
            Self::Remote(info) => Some(info),
            _ => None,
        }
    }
}

/// Parse the body of a non-success response.
///
/// A structured API error object becomes [`MessagesError::Remote`]; any other
/// body is kept verbatim in [`MessagesError::UnexpectedResponse`].
pub fn parse_error_response(status: reqwest::StatusCode, bytes: &[u8]) -> MessagesError {
    match serde_json::from_slice::<ApiErrorResponse>(bytes) {
        Ok(payload) => MessagesError::Remote(payload.error),
        Err(_) => MessagesError::UnexpectedResponse {
            status: status.as_u16(),
            body: String::from_utf8_lossy(bytes).into_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_structured_error_body_is_remote() {
        let body = br#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let error = parse_error_response(StatusCode::from_u16(529).unwrap(), body);

        assert_eq!(
            error.remote(),
            Some(&ErrorInfo::new("overloaded_error", "Overloaded"))
        );
        assert_eq!(error.kind(), ErrorKind::ServerOverloaded);
        assert!(error.is_retryable());
    }

    #[test]
    fn test_plain_text_body_falls_back_to_status() {
        let error = parse_error_response(StatusCode::UNAUTHORIZED, b"go away");

        assert!(matches!(
            &error,
            MessagesError::UnexpectedResponse { status: 401, body } if body == "go away"
        ));
        assert_eq!(error.kind(), ErrorKind::Auth);
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_protocol_errors_are_not_retryable() {
        let error = MessagesError::from(ProtocolError::IncompleteStream);
        assert_eq!(error.kind(), ErrorKind::Protocol);
        assert!(!error.is_retryable());
        assert_eq!(
            error.to_string(),
            "Protocol violation: Stream ended before `message_stop`"
        );
    }
}
