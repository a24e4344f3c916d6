//! Bounded simulate-render-deliver loop feeding an external encoder.
//!
//! Each iteration computes a control input, advances the simulation, captures
//! a frame, and writes it to the encoder. The first failure ends the run; the
//! encoder is always closed exactly once on the way out, and the run produces
//! a single [`RunReport`].

pub mod config;
pub mod control;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod stop;
pub mod traits;

pub use config::{PipelineConfig, RetryPolicy, DEFAULT_MAX_FRAMES};
pub use control::{
    ConstantControl, ControlInput, ControlPolicy, ControlRange, PrefixControl, UniformControl,
};
pub use error::{PipelineError, RenderError, Result, SimulationError};
pub use pipeline::{PipelineState, StreamingPipeline};
pub use report::{CloseStatus, RunOutcome, RunReport, RunSummary};
pub use stop::StopHandle;
pub use traits::{FrameSource, SimulationStepper};
