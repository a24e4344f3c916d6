use simcast_frame::Frame;

use crate::config::EncoderConfig;
use crate::error::{ExitReport, Result};
use crate::process::EncoderProcess;

/// A byte sink that accepts whole frames and can be shut down once.
///
/// Implemented by [`EncoderProcess`]; the pipeline is written against this
/// trait so it can be exercised without a real encoder.
pub trait FrameSink {
    /// Deliver one frame in full, or fail without reporting partial success.
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Signal end of input and wait for the consumer to finish.
    fn close(&mut self) -> Result<ExitReport>;

    /// Buffered diagnostic output. Must not block.
    fn diagnostics(&self) -> String;
}

/// Starts a fresh [`FrameSink`] for one pipeline run.
pub trait EncoderLauncher {
    type Sink: FrameSink;

    fn launch(&mut self) -> Result<Self::Sink>;
}

impl FrameSink for EncoderProcess {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        EncoderProcess::write_frame(self, frame)
    }

    fn close(&mut self) -> Result<ExitReport> {
        EncoderProcess::close(self)
    }

    fn diagnostics(&self) -> String {
        EncoderProcess::diagnostics(self)
    }
}

impl EncoderLauncher for EncoderConfig {
    type Sink = EncoderProcess;

    fn launch(&mut self) -> Result<EncoderProcess> {
        EncoderProcess::spawn(self)
    }
}
