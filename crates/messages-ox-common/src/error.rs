use thiserror::Error;

/// A type alias for a boxed error that is thread-safe.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while turning a byte source into frames.
#[derive(Error, Debug)]
pub enum FrameError {
    /// HTTP body read failed
    #[error("HTTP body read failed: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error from the underlying byte source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other failure reported by the byte source
    #[error("Transport error: {0}")]
    Transport(BoxedError),

    /// A complete line was not valid UTF-8
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// A single line grew past the configured limit
    #[error("Line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
}

impl FrameError {
    /// Wraps an arbitrary byte-source error.
    pub fn transport(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(error))
    }
}
