use std::thread;
use std::time::{Duration, Instant};

use simcast_encoder::{EncoderError, EncoderLauncher, FrameSink};
use tracing::{debug, info, info_span, warn};

use crate::config::PipelineConfig;
use crate::control::ControlPolicy;
use crate::error::{PipelineError, RenderError, Result};
use crate::report::{CloseStatus, RunOutcome, RunReport};
use crate::stop::StopHandle;
use crate::traits::{FrameSource, SimulationStepper};

/// Phase of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    /// Iterations are executing; the encoder is running.
    Running,
    /// No further iteration will run; the encoder is being closed.
    Draining,
    Stopped,
}

/// Why the loop stopped iterating without an error.
#[derive(Debug, Clone, Copy)]
enum DrainReason {
    Completed,
    Stopped,
}

/// Synchronous simulate-render-deliver loop.
///
/// One writer, one in-flight frame, strict step order. A slow encoder stalls
/// the loop instead of losing frames.
#[derive(Debug)]
pub struct StreamingPipeline {
    config: PipelineConfig,
    state: PipelineState,
    stop: StopHandle,
    frames_delivered: u64,
}

impl StreamingPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            state: PipelineState::Idle,
            stop: StopHandle::new(),
            frames_delivered: 0,
        }
    }

    /// Handle for requesting a stop from another thread or a signal handler.
    ///
    /// A request ends the run in progress, or the next one if none is
    /// running, and is consumed when that run finishes.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute one run: spawn the encoder, iterate, drain, and report.
    ///
    /// Each run launches a fresh encoder; nothing is carried over from a
    /// previous run.
    pub fn run<L, S, F, P>(
        &mut self,
        launcher: &mut L,
        stepper: &mut S,
        source: &mut F,
        policy: &mut P,
    ) -> RunReport
    where
        L: EncoderLauncher,
        S: SimulationStepper,
        F: FrameSource<S::State>,
        P: ControlPolicy,
    {
        let span = info_span!("stream", max_frames = self.config.max_frames);
        let _enter = span.enter();
        let started = Instant::now();
        self.state = PipelineState::Idle;
        self.frames_delivered = 0;

        let mut sink = match self.spawn_encoder(launcher) {
            Ok(sink) => sink,
            Err(err) => {
                warn!(error = %err, "encoder did not start");
                self.stop.clear();
                self.transition(PipelineState::Stopped);
                return RunReport {
                    outcome: RunOutcome::Failed(err),
                    frames_delivered: 0,
                    close: CloseStatus::NotAttempted,
                    secondary: Vec::new(),
                    diagnostics: String::new(),
                    elapsed: started.elapsed(),
                };
            }
        };

        self.transition(PipelineState::Running);
        let streamed = self.stream(&mut sink, stepper, source, policy);
        self.transition(PipelineState::Draining);

        let mut secondary = Vec::new();
        let closed = sink.close();
        let diagnostics = sink.diagnostics();
        let close = match &closed {
            Ok(report) => CloseStatus::Clean(*report),
            Err(err) => CloseStatus::Failed(err.to_string()),
        };

        let outcome = match (streamed, closed) {
            (Ok(DrainReason::Completed), Ok(_)) => RunOutcome::Completed,
            (Ok(DrainReason::Stopped), Ok(_)) => RunOutcome::Stopped,
            (Ok(_), Err(source)) => RunOutcome::Failed(PipelineError::EncoderExit { source }),
            (Err(err), Ok(_)) => RunOutcome::Failed(err),
            (Err(err), Err(close_err)) => {
                secondary.push(format!("encoder close failed: {close_err}"));
                RunOutcome::Failed(err)
            }
        };

        self.stop.clear();
        self.transition(PipelineState::Stopped);
        let report = RunReport {
            outcome,
            frames_delivered: self.frames_delivered,
            close,
            secondary,
            diagnostics,
            elapsed: started.elapsed(),
        };
        match report.error() {
            None => info!(
                status = report.status(),
                frames = report.frames_delivered,
                elapsed = ?report.elapsed,
                "run finished"
            ),
            Some(err) => warn!(
                status = report.status(),
                frames = report.frames_delivered,
                error = %err,
                "run failed"
            ),
        }
        report
    }

    fn spawn_encoder<L: EncoderLauncher>(&self, launcher: &mut L) -> Result<L::Sink> {
        let retry = self.config.spawn_retry;
        let max_attempts = retry.max_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            match launcher.launch() {
                Ok(sink) => return Ok(sink),
                Err(err @ EncoderError::Spawn { .. })
                    if attempt < max_attempts && !self.stop.is_stop_requested() =>
                {
                    let delay = retry.backoff(attempt);
                    warn!(attempt, ?delay, error = %err, "encoder spawn failed, retrying");
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(source) => {
                    return Err(PipelineError::Spawn {
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }

    fn stream<K, S, F, P>(
        &mut self,
        sink: &mut K,
        stepper: &mut S,
        source: &mut F,
        policy: &mut P,
    ) -> Result<DrainReason>
    where
        K: FrameSink,
        S: SimulationStepper,
        F: FrameSource<S::State>,
        P: ControlPolicy,
    {
        let format = source.format();
        let actuators = stepper.actuator_count();
        let mut pacer = self.config.pacing.map(Pacer::new);

        loop {
            if self.frames_delivered >= self.config.max_frames {
                return Ok(DrainReason::Completed);
            }
            if self.stop.is_stop_requested() {
                info!(frames = self.frames_delivered, "stop requested");
                return Ok(DrainReason::Stopped);
            }
            if let Some(pacer) = pacer.as_mut() {
                pacer.wait();
            }

            let iteration = self.frames_delivered + 1;
            let input = policy
                .next(iteration, actuators)
                .clamped(&self.config.control_range);

            stepper
                .advance(&input)
                .map_err(|source| PipelineError::Simulation { iteration, source })?;

            let frame = source
                .capture(stepper.state())
                .map_err(|source| PipelineError::Render { iteration, source })?;
            if frame.format() != format {
                return Err(PipelineError::Render {
                    iteration,
                    source: RenderError::new(format!(
                        "frame format changed from {format} to {}",
                        frame.format()
                    )),
                });
            }

            if let Err(source) = sink.write_frame(&frame) {
                return Err(PipelineError::Delivery {
                    iteration,
                    source,
                    diagnostics: sink.diagnostics(),
                });
            }

            self.frames_delivered = iteration;
            debug!(iteration, bytes = frame.len(), "frame delivered");
        }
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = ?self.state, to = ?next, "pipeline state");
        self.state = next;
    }
}

/// Spaces iteration starts at least `interval` apart.
struct Pacer {
    interval: Duration,
    next: Option<Instant>,
}

impl Pacer {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: None,
        }
    }

    fn wait(&mut self) {
        let now = Instant::now();
        let start = match self.next {
            Some(next) if next > now => {
                thread::sleep(next - now);
                next
            }
            // Behind schedule: restart the cadence rather than bursting to catch up.
            _ => now,
        };
        self.next = Some(start + self.interval);
    }
}
