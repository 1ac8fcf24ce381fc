use bon::Builder;
use tokio_util::sync::CancellationToken;

/// Longest single SSE line accepted before the stream fails.
pub const DEFAULT_MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// Settings for one [`MessageStream`](super::MessageStream).
#[derive(Debug, Clone, Builder)]
pub struct StreamOptions {
    #[builder(default = DEFAULT_MAX_LINE_BYTES)]
    pub max_line_bytes: usize,
    /// Cancelling this token ends the stream at its next pull and drops the
    /// byte source.
    pub cancellation: Option<CancellationToken>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = StreamOptions::default();
        assert_eq!(options.max_line_bytes, DEFAULT_MAX_LINE_BYTES);
        assert!(options.cancellation.is_none());
    }

    #[test]
    fn test_builder() {
        let token = CancellationToken::new();
        let options = StreamOptions::builder()
            .max_line_bytes(1024)
            .cancellation(token.clone())
            .build();

        assert_eq!(options.max_line_bytes, 1024);
        token.cancel();
        assert!(options.cancellation.unwrap().is_cancelled());
    }
}
