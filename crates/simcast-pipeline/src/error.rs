use std::error::Error as StdError;

use simcast_encoder::EncoderError;
use simcast_frame::FrameError;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure reported by a simulation stepper.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SimulationError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl SimulationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure reported by a frame source.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct RenderError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<FrameError> for RenderError {
    fn from(err: FrameError) -> Self {
        Self::with_source(format!("invalid frame: {err}"), err)
    }
}

/// The single terminal failure of a pipeline run.
///
/// Iterations are 1-based: iteration `k` produces the `k`-th frame.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The encoder could not be started; no iteration ran.
    #[error("encoder spawn failed after {attempts} attempt(s): {source}")]
    Spawn {
        attempts: u32,
        #[source]
        source: EncoderError,
    },

    /// The simulation stepper failed.
    #[error("simulation failed at iteration {iteration}: {source}")]
    Simulation {
        iteration: u64,
        #[source]
        source: SimulationError,
    },

    /// The frame source failed or produced an unusable frame.
    #[error("render failed at iteration {iteration}: {source}")]
    Render {
        iteration: u64,
        #[source]
        source: RenderError,
    },

    /// A frame could not be delivered to the encoder.
    #[error("frame delivery failed at iteration {iteration}: {source}")]
    Delivery {
        iteration: u64,
        #[source]
        source: EncoderError,
        diagnostics: String,
    },

    /// Every frame was delivered but the encoder did not shut down cleanly.
    #[error("encoder shutdown failed: {source}")]
    EncoderExit {
        #[source]
        source: EncoderError,
    },
}

impl PipelineError {
    /// Iteration at which the failure was detected, if it happened inside the loop.
    pub fn iteration(&self) -> Option<u64> {
        match self {
            PipelineError::Simulation { iteration, .. }
            | PipelineError::Render { iteration, .. }
            | PipelineError::Delivery { iteration, .. } => Some(*iteration),
            PipelineError::Spawn { .. } | PipelineError::EncoderExit { .. } => None,
        }
    }

    /// Encoder output captured when the failure was detected.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            PipelineError::Delivery { diagnostics, .. } => Some(diagnostics),
            PipelineError::EncoderExit {
                source: EncoderError::AbnormalExit { diagnostics, .. },
            } => Some(diagnostics),
            _ => None,
        }
    }

    /// Stable short name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Spawn { .. } => "spawn_error",
            PipelineError::Simulation { .. } => "simulation_error",
            PipelineError::Render { .. } => "render_error",
            PipelineError::Delivery { .. } => "delivery_error",
            PipelineError::EncoderExit { .. } => "encoder_exit",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_error_exposes_iteration_and_diagnostics() {
        let err = PipelineError::Delivery {
            iteration: 2,
            source: EncoderError::ChannelClosed,
            diagnostics: "rtsp: connection refused".to_string(),
        };
        assert_eq!(err.iteration(), Some(2));
        assert_eq!(err.diagnostics(), Some("rtsp: connection refused"));
        assert_eq!(err.kind(), "delivery_error");
        assert_eq!(
            err.to_string(),
            "frame delivery failed at iteration 2: encoder input channel closed by peer"
        );
    }

    #[test]
    fn render_error_keeps_frame_error_source() {
        let err = RenderError::from(FrameError::SizeMismatch {
            expected: 4,
            actual: 3,
        });
        assert!(err.message().starts_with("invalid frame"));
        assert!(StdError::source(&err).is_some());
    }

    #[test]
    fn spawn_error_has_no_iteration() {
        let err = PipelineError::Spawn {
            attempts: 1,
            source: EncoderError::InvalidConfig("empty".to_string()),
        };
        assert_eq!(err.iteration(), None);
        assert_eq!(err.diagnostics(), None);
    }
}
