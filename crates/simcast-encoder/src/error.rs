use std::fmt;
use std::process::ExitStatus;
use std::time::Duration;

use simcast_frame::FrameError;

/// How an encoder process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Whether the status indicates success.
    pub success: bool,
}

impl ExitReport {
    pub fn from_code(code: i32) -> Self {
        Self {
            code: Some(code),
            success: code == 0,
        }
    }
}

impl From<ExitStatus> for ExitReport {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
            success: status.success(),
        }
    }
}

impl fmt::Display for ExitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Errors that can occur while driving the encoder process.
#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    /// The encoder binary could not be launched.
    #[error("failed to spawn encoder `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The encoder closed its input before any byte of the frame was accepted.
    #[error("encoder input channel closed by peer")]
    ChannelClosed,

    /// The encoder closed its input in the middle of a frame.
    #[error("partial frame write: {written} of {expected} bytes accepted before the channel closed")]
    PartialWrite { written: usize, expected: usize },

    /// The encoder exited with a failure status.
    #[error("encoder exited abnormally ({status})")]
    AbnormalExit {
        status: ExitReport,
        diagnostics: String,
    },

    /// A bounded wait expired.
    #[error("encoder {operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// The frame could not be accepted (wrong format or size).
    #[error("frame rejected: {0}")]
    Frame(FrameError),

    /// The encoder configuration is unusable.
    #[error("invalid encoder configuration: {0}")]
    InvalidConfig(String),

    /// `close()` was called on a handle that already terminated.
    #[error("encoder process already closed")]
    AlreadyClosed,

    /// An I/O error occurred on the process or its pipes.
    #[error("encoder I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EncoderError {
    /// Whether this error means frames can no longer reach the encoder.
    pub fn is_channel_failure(&self) -> bool {
        matches!(
            self,
            EncoderError::ChannelClosed
                | EncoderError::PartialWrite { .. }
                | EncoderError::Timeout { .. }
                | EncoderError::Io(_)
        )
    }
}

impl From<FrameError> for EncoderError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::ChannelClosed => EncoderError::ChannelClosed,
            FrameError::PartialWrite { written, expected } => {
                EncoderError::PartialWrite { written, expected }
            }
            FrameError::Timeout { timeout, .. } => EncoderError::Timeout {
                operation: "write",
                timeout,
            },
            FrameError::Io(io) => EncoderError::Io(io),
            other => EncoderError::Frame(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, EncoderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_channel_errors_flatten() {
        assert!(matches!(
            EncoderError::from(FrameError::ChannelClosed),
            EncoderError::ChannelClosed
        ));
        assert!(matches!(
            EncoderError::from(FrameError::PartialWrite {
                written: 3,
                expected: 9
            }),
            EncoderError::PartialWrite {
                written: 3,
                expected: 9
            }
        ));
        assert!(matches!(
            EncoderError::from(FrameError::Timeout {
                timeout: Duration::from_millis(5),
                written: 0,
                expected: 9
            }),
            EncoderError::Timeout {
                operation: "write",
                ..
            }
        ));
    }

    #[test]
    fn format_errors_stay_frame_errors() {
        let err = EncoderError::from(FrameError::SizeMismatch {
            expected: 3,
            actual: 2,
        });
        assert!(matches!(err, EncoderError::Frame(_)));
        assert!(!err.is_channel_failure());
    }

    #[test]
    fn exit_report_display() {
        assert_eq!(ExitReport::from_code(1).to_string(), "exit code 1");
        assert!(ExitReport::from_code(0).success);
        let signalled = ExitReport {
            code: None,
            success: false,
        };
        assert_eq!(signalled.to_string(), "terminated by signal");
    }
}
