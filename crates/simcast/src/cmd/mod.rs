use std::path::PathBuf;

use clap::{Args, Subcommand};
use simcast_encoder::RtspTransport;
use simcast_frame::PixelFormat;

use crate::exit::CliResult;
use crate::output::OutputFormat;
use crate::settings::ControlKind;

pub mod doctor;
pub mod stream;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the demo simulation and stream it through the encoder.
    Stream(StreamArgs),
    /// Run local environment health checks.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Stream(args) => stream::run(args, format),
        Command::Doctor(args) => doctor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct StreamArgs {
    /// JSON settings file. Flags override its values.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Destination URL handed to the encoder.
    #[arg(long, env = "SIMCAST_URL")]
    pub url: Option<String>,
    /// Frame width in pixels.
    #[arg(long)]
    pub width: Option<u32>,
    /// Frame height in pixels.
    #[arg(long)]
    pub height: Option<u32>,
    /// Raw pixel layout (rgb24, bgr24, rgba, bgra, gray).
    #[arg(long, value_name = "FORMAT")]
    pub pixel_format: Option<PixelFormat>,
    /// Declared input frame rate.
    #[arg(long)]
    pub fps: Option<u32>,
    /// Number of frames to stream.
    #[arg(long)]
    pub frames: Option<u64>,
    /// Encoder program.
    #[arg(long, env = "SIMCAST_ENCODER")]
    pub encoder: Option<String>,
    /// Replace the generated encoder arguments (repeatable).
    #[arg(long = "encoder-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub encoder_args: Vec<String>,
    /// RTSP lower transport (tcp, udp).
    #[arg(long)]
    pub transport: Option<RtspTransport>,
    /// Control policy.
    #[arg(long, value_enum)]
    pub control: Option<ControlKind>,
    /// Value used by the constant and prefix policies.
    #[arg(long, allow_hyphen_values = true)]
    pub control_value: Option<f64>,
    /// Number of actuators driven by the prefix policy.
    #[arg(long)]
    pub control_count: Option<usize>,
    /// Seed for the uniform policy.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Number of simulated bodies.
    #[arg(long)]
    pub bodies: Option<usize>,
    /// Pace iterations at the declared frame rate.
    #[arg(long)]
    pub realtime: bool,
    /// Give up on a frame the encoder does not accept in time (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION")]
    pub write_timeout: Option<String>,
    /// Kill the encoder if it has not exited this long after end of input.
    #[arg(long, value_name = "DURATION")]
    pub exit_timeout: Option<String>,
    /// Print the resolved plan and encoder command without running.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Encoder program to probe.
    #[arg(long, env = "SIMCAST_ENCODER", default_value = simcast_encoder::DEFAULT_PROGRAM)]
    pub encoder: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
