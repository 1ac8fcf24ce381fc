#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items
)]

//! Server-Sent-Events framing shared by the messages-ox stream engine.
//!
//! This crate knows nothing about the payloads it carries: it turns an
//! arbitrary chunked byte source into `(event, data)` frames and leaves all
//! JSON handling to the caller.

pub mod error;
pub mod sse;

pub use error::FrameError;
pub use sse::{Frame, FrameParser, FrameReader, parse_frames};

/// Re-export common types for convenience
pub use bytes::Bytes;
pub use futures_util::stream::BoxStream;
