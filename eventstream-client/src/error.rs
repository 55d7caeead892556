//! Stream decoding errors.
//!
//! This module provides [`StreamError`], the error type yielded by
//! [`StreamDecoder`](crate::StreamDecoder).

use eventstream_core::FrameError;

/// Errors that end a decoded stream.
///
/// A stream yields at most one error. After it, the decoder has released its
/// source and returns `None`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The underlying byte source failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// A frame could not be decoded.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The source ended in the middle of a frame (strict mode only).
    #[error("stream ended with {remaining} bytes of incomplete data")]
    IncompleteTrailingData { remaining: usize },
}

impl StreamError {
    /// Check if the error came from the byte source rather than the data.
    pub fn is_transport(&self) -> bool {
        matches!(self, StreamError::Transport(_))
    }

    /// Get the frame error, if this is one.
    pub fn frame_error(&self) -> Option<&FrameError> {
        match self {
            StreamError::Frame(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        StreamError::Transport(err.to_string())
    }
}
