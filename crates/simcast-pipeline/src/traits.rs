use simcast_frame::{Frame, FrameFormat};

use crate::control::ControlInput;
use crate::error::{RenderError, SimulationError};

/// Advances a simulation by one fixed time step.
///
/// The stepper exclusively owns the simulation state; the pipeline only
/// triggers one advance per iteration and lends the state to the frame source.
pub trait SimulationStepper {
    type State: ?Sized;

    /// Number of actuators a control input must cover.
    fn actuator_count(&self) -> usize;

    fn advance(&mut self, input: &ControlInput) -> Result<(), SimulationError>;

    fn state(&self) -> &Self::State;
}

/// Rasterizes one frame from a simulation state.
///
/// The format must not change for the lifetime of a pipeline run.
pub trait FrameSource<State: ?Sized> {
    fn format(&self) -> FrameFormat;

    fn capture(&mut self, state: &State) -> Result<Frame, RenderError>;
}
