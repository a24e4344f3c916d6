use std::time::Duration;

use crate::format::FrameFormat;

/// Errors that can occur while building or writing raw frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame format is unusable (zero dimension, overflowing size, unknown layout).
    #[error("invalid frame format: {0}")]
    InvalidFormat(String),

    /// The pixel buffer length does not match the frame format.
    #[error("frame buffer is {actual} bytes, format requires {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The frame was produced in a format other than the one the sink was configured for.
    #[error("frame format {actual} does not match configured format {expected}")]
    FormatMismatch {
        expected: FrameFormat,
        actual: FrameFormat,
    },

    /// The reader closed the channel before any byte of the frame was accepted.
    #[error("channel closed by peer")]
    ChannelClosed,

    /// The reader closed the channel after accepting only part of the frame.
    #[error("partial write: {written} of {expected} bytes accepted before the channel closed")]
    PartialWrite { written: usize, expected: usize },

    /// The channel did not accept the full frame before the write deadline.
    #[error("write timed out after {timeout:?} ({written} of {expected} bytes accepted)")]
    Timeout {
        timeout: Duration,
        written: usize,
        expected: usize,
    },

    /// An I/O error occurred while writing the frame.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
