use std::time::Duration;

use simcast_encoder::ExitReport;

use crate::error::PipelineError;

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// The configured frame count was reached.
    Completed,
    /// A stop was requested and honored at an iteration boundary.
    Stopped,
    /// The earliest failure detected during the run.
    Failed(PipelineError),
}

/// Result of the single `close()` performed while draining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseStatus {
    /// No encoder was running (spawn failed).
    NotAttempted,
    /// The encoder exited cleanly.
    Clean(ExitReport),
    /// Close failed; the message describes why.
    Failed(String),
}

/// The one terminal report of a pipeline run.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Frames fully written to the encoder.
    pub frames_delivered: u64,
    pub close: CloseStatus,
    /// Failures observed after the primary one, in detection order.
    pub secondary: Vec<String>,
    /// Encoder diagnostic output captured after shutdown.
    pub diagnostics: String,
    pub elapsed: Duration,
}

/// Summary of a run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_delivered: u64,
    /// True when the run ended on a stop request rather than the frame limit.
    pub stopped: bool,
    pub exit: Option<ExitReport>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, RunOutcome::Failed(_))
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match &self.outcome {
            RunOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Short status label: `completed`, `stopped`, or the failure kind.
    pub fn status(&self) -> &'static str {
        match &self.outcome {
            RunOutcome::Completed => "completed",
            RunOutcome::Stopped => "stopped",
            RunOutcome::Failed(err) => err.kind(),
        }
    }

    pub fn into_result(self) -> Result<RunSummary, PipelineError> {
        let exit = match self.close {
            CloseStatus::Clean(report) => Some(report),
            _ => None,
        };
        match self.outcome {
            RunOutcome::Completed => Ok(RunSummary {
                frames_delivered: self.frames_delivered,
                stopped: false,
                exit,
                elapsed: self.elapsed,
            }),
            RunOutcome::Stopped => Ok(RunSummary {
                frames_delivered: self.frames_delivered,
                stopped: true,
                exit,
                elapsed: self.elapsed,
            }),
            RunOutcome::Failed(err) => Err(err),
        }
    }
}
