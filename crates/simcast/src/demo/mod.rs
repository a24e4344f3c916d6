//! Built-in collaborators for end-to-end runs.
//!
//! [`MassSpringSim`] is a row of thrust-driven bodies hanging from springs and
//! [`DiscRenderer`] draws each body as a filled disc. Neither aims at physical
//! or visual fidelity; they exist to feed the pipeline.

mod raster;
mod sim;

pub use raster::DiscRenderer;
pub use sim::{Body, MassSpringSim, SimParams, SimState};
