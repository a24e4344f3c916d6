use std::fmt;
use std::io;

use simcast_encoder::EncoderError;
use simcast_pipeline::{PipelineError, RunOutcome, RunReport};

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const DELIVERY_ERROR: i32 = 3;
pub const SPAWN_ERROR: i32 = 4;
pub const ENCODER_EXIT: i32 = 5;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;
pub const INTERRUPTED: i32 = 130;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => USAGE,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

/// Exit code for an encoder failure.
pub fn encoder_code(err: &EncoderError) -> i32 {
    match err {
        EncoderError::Spawn { .. } => SPAWN_ERROR,
        EncoderError::InvalidConfig(_) => USAGE,
        EncoderError::Timeout { .. } => TIMEOUT,
        EncoderError::AbnormalExit { .. } | EncoderError::AlreadyClosed => ENCODER_EXIT,
        EncoderError::ChannelClosed
        | EncoderError::PartialWrite { .. }
        | EncoderError::Io(_) => DELIVERY_ERROR,
        EncoderError::Frame(_) => DATA_INVALID,
    }
}

pub fn pipeline_code(err: &PipelineError) -> i32 {
    match err {
        PipelineError::Spawn { source, .. } => match source {
            EncoderError::InvalidConfig(_) => USAGE,
            _ => SPAWN_ERROR,
        },
        PipelineError::Simulation { .. } | PipelineError::Render { .. } => FAILURE,
        PipelineError::Delivery { source, .. } => match source {
            EncoderError::Timeout { .. } => TIMEOUT,
            _ => DELIVERY_ERROR,
        },
        PipelineError::EncoderExit { source } => match source {
            EncoderError::Timeout { .. } => TIMEOUT,
            _ => ENCODER_EXIT,
        },
    }
}

/// Exit code for a finished run.
pub fn report_code(report: &RunReport) -> i32 {
    match &report.outcome {
        RunOutcome::Completed => SUCCESS,
        RunOutcome::Stopped => INTERRUPTED,
        RunOutcome::Failed(err) => pipeline_code(err),
    }
}
