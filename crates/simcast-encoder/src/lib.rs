//! Lifecycle management for an external raw-video encoder process.
//!
//! The encoder (normally `ffmpeg`) is spawned with a raw-video input on its
//! stdin and an encoded output pushed to a network destination. This crate
//! owns that process end to end:
//! - [`EncoderProcess::spawn`] starts it from an explicit [`EncoderConfig`]
//! - [`EncoderProcess::write_frame`] delivers whole frames or reports how the channel broke
//! - [`EncoderProcess::close`] signals end of input and collects the exit status
//! - [`EncoderProcess::diagnostics`] returns the tail of its stderr without blocking
//!
//! The [`FrameSink`] and [`EncoderLauncher`] traits are the seams the
//! streaming pipeline is written against.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod process;
pub mod sink;

pub use config::{
    Destination, EncoderConfig, RtspTransport, DEFAULT_DIAGNOSTICS_CAPACITY, DEFAULT_PROGRAM,
    DEFAULT_URL,
};
pub use diagnostics::DiagnosticsBuffer;
pub use error::{EncoderError, ExitReport, Result};
pub use process::{EncoderProcess, EncoderState};
pub use sink::{EncoderLauncher, FrameSink};
