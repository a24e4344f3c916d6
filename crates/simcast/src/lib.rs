//! Stream a stepped simulation as live video through an external encoder.
//!
//! simcast advances a simulation one fixed step at a time, rasterizes a frame
//! per step, and pipes the raw pixels into an encoder process (normally
//! `ffmpeg`) that publishes the stream.
//!
//! # Crate Structure
//!
//! - [`frame`]: raw frame layout and the blocking frame writer
//! - [`encoder`]: encoder process lifecycle and diagnostics
//! - [`pipeline`]: the bounded simulate, render, deliver loop
//! - [`demo`]: a small mass-spring simulation and software rasterizer

/// Re-export frame types.
pub mod frame {
    pub use simcast_frame::*;
}

/// Re-export encoder types.
pub mod encoder {
    pub use simcast_encoder::*;
}

/// Re-export pipeline types.
pub mod pipeline {
    pub use simcast_pipeline::*;
}

pub mod demo;
