use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use simcast_encoder::{Destination, EncoderConfig, RtspTransport, DEFAULT_PROGRAM, DEFAULT_URL};
use simcast_frame::{FrameFormat, PixelFormat, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use simcast_pipeline::{
    ConstantControl, ControlInput, ControlPolicy, ControlRange, PipelineConfig, PrefixControl,
    RetryPolicy, UniformControl, DEFAULT_MAX_FRAMES,
};

use crate::exit::{encoder_code, io_error, CliError, CliResult, DATA_INVALID, USAGE};

const DEFAULT_FPS: u32 = 30;
const DEFAULT_BODIES: usize = 6;

/// How actuator commands are chosen each step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    /// Every actuator gets the same value.
    Constant,
    /// The first N actuators get the value; the rest stay at zero.
    #[default]
    Prefix,
    /// Seeded uniform random values across the control range.
    Uniform,
}

/// Stream settings loaded from a `--config` JSON file.
///
/// Every field is optional; command-line flags take precedence.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamSettings {
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub pixel_format: Option<PixelFormat>,
    pub fps: Option<u32>,
    pub frames: Option<u64>,
    pub encoder: Option<String>,
    pub encoder_args: Option<Vec<String>>,
    pub transport: Option<RtspTransport>,
    pub codec: Option<String>,
    pub preset: Option<String>,
    pub tune: Option<String>,
    pub control: Option<ControlKind>,
    pub control_value: Option<f64>,
    pub control_count: Option<usize>,
    pub control_range: Option<ControlRange>,
    pub seed: Option<u64>,
    pub bodies: Option<usize>,
    pub realtime: Option<bool>,
    pub write_timeout_ms: Option<u64>,
    pub exit_timeout_ms: Option<u64>,
    pub spawn_attempts: Option<u32>,
}

impl StreamSettings {
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("cannot read {}", path.display()), err))?;
        Self::from_json(&text).map_err(|err| {
            CliError::new(
                DATA_INVALID,
                format!("invalid settings in {}: {}", path.display(), err.message),
            )
        })
    }

    pub fn from_json(text: &str) -> CliResult<Self> {
        serde_json::from_str(text).map_err(|err| CliError::new(DATA_INVALID, err.to_string()))
    }
}

/// Values given on the command line; each one overrides the settings file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub pixel_format: Option<PixelFormat>,
    pub fps: Option<u32>,
    pub frames: Option<u64>,
    pub encoder: Option<String>,
    pub encoder_args: Vec<String>,
    pub transport: Option<RtspTransport>,
    pub control: Option<ControlKind>,
    pub control_value: Option<f64>,
    pub control_count: Option<usize>,
    pub seed: Option<u64>,
    pub bodies: Option<usize>,
    pub realtime: bool,
    pub write_timeout: Option<Duration>,
    pub exit_timeout: Option<Duration>,
}

/// Fully resolved run parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamPlan {
    pub encoder: EncoderConfig,
    pub pipeline: PipelineConfig,
    pub control: ControlKind,
    pub control_value: f64,
    pub control_count: usize,
    pub seed: u64,
    pub bodies: usize,
}

impl StreamPlan {
    pub fn resolve(settings: StreamSettings, flags: Overrides) -> CliResult<Self> {
        let pixel_format = flags
            .pixel_format
            .or(settings.pixel_format)
            .unwrap_or_default();
        let input = FrameFormat::new(
            flags.width.or(settings.width).unwrap_or(DEFAULT_WIDTH),
            flags.height.or(settings.height).unwrap_or(DEFAULT_HEIGHT),
            pixel_format,
        )
        .map_err(|err| CliError::new(USAGE, err.to_string()))?;

        let defaults = EncoderConfig::default();
        let args = if flags.encoder_args.is_empty() {
            settings.encoder_args
        } else {
            Some(flags.encoder_args)
        };
        let encoder = EncoderConfig {
            program: flags
                .encoder
                .or(settings.encoder)
                .unwrap_or_else(|| DEFAULT_PROGRAM.to_string()),
            input,
            frame_rate: flags.fps.or(settings.fps).unwrap_or(DEFAULT_FPS),
            destination: Destination {
                url: flags
                    .url
                    .or(settings.url)
                    .unwrap_or_else(|| DEFAULT_URL.to_string()),
                transport: flags.transport.or(settings.transport).unwrap_or_default(),
                ..Destination::default()
            },
            codec: settings.codec.unwrap_or(defaults.codec),
            preset: settings.preset.or(defaults.preset),
            tune: settings.tune.or(defaults.tune),
            args,
            write_timeout: flags
                .write_timeout
                .or(settings.write_timeout_ms.map(Duration::from_millis)),
            exit_timeout: flags
                .exit_timeout
                .or(settings.exit_timeout_ms.map(Duration::from_millis)),
            ..defaults
        };
        encoder
            .validate()
            .map_err(|err| CliError::new(encoder_code(&err), err.to_string()))?;

        let control_range = match settings.control_range {
            Some(range) => ControlRange::new(range.min, range.max).ok_or_else(|| {
                CliError::new(
                    DATA_INVALID,
                    format!(
                        "control range [{}, {}] must be finite with min <= max",
                        range.min, range.max
                    ),
                )
            })?,
            None => ControlRange::default(),
        };

        let realtime = flags.realtime || settings.realtime.unwrap_or(false);
        let pipeline = PipelineConfig {
            max_frames: flags.frames.or(settings.frames).unwrap_or(DEFAULT_MAX_FRAMES),
            control_range,
            pacing: realtime.then(|| encoder.frame_interval()),
            spawn_retry: RetryPolicy {
                max_attempts: settings.spawn_attempts.unwrap_or(1),
                ..RetryPolicy::default()
            },
        };

        let prefix = PrefixControl::default();
        let bodies = flags.bodies.or(settings.bodies).unwrap_or(DEFAULT_BODIES);
        if bodies == 0 {
            return Err(CliError::new(USAGE, "at least one body is required"));
        }

        Ok(Self {
            encoder,
            pipeline,
            control: flags.control.or(settings.control).unwrap_or_default(),
            control_value: flags
                .control_value
                .or(settings.control_value)
                .unwrap_or(prefix.value),
            control_count: flags
                .control_count
                .or(settings.control_count)
                .unwrap_or(prefix.count),
            seed: flags.seed.or(settings.seed).unwrap_or(0),
            bodies,
        })
    }

    pub fn control_policy(&self) -> Control {
        match self.control {
            ControlKind::Constant => Control::Constant(ConstantControl(self.control_value)),
            ControlKind::Prefix => Control::Prefix(PrefixControl {
                count: self.control_count,
                value: self.control_value,
            }),
            ControlKind::Uniform => {
                Control::Uniform(UniformControl::new(self.pipeline.control_range, self.seed))
            }
        }
    }

    /// Short human description of the control policy.
    pub fn control_summary(&self) -> String {
        match self.control {
            ControlKind::Constant => format!("constant {}", self.control_value),
            ControlKind::Prefix => {
                format!("first {} at {}", self.control_count, self.control_value)
            }
            ControlKind::Uniform => {
                let range = self.pipeline.control_range;
                format!("uniform [{}, {}) seed {}", range.min, range.max, self.seed)
            }
        }
    }
}

/// The control policy selected on the command line.
#[derive(Debug, Clone)]
pub enum Control {
    Constant(ConstantControl),
    Prefix(PrefixControl),
    Uniform(UniformControl),
}

impl ControlPolicy for Control {
    fn next(&mut self, iteration: u64, actuators: usize) -> ControlInput {
        match self {
            Control::Constant(policy) => policy.next(iteration, actuators),
            Control::Prefix(policy) => policy.next(iteration, actuators),
            Control::Uniform(policy) => policy.next(iteration, actuators),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_stream() {
        let plan = StreamPlan::resolve(StreamSettings::default(), Overrides::default()).unwrap();
        assert_eq!(plan.encoder.program, "ffmpeg");
        assert_eq!(plan.encoder.input.video_size(), "640x480");
        assert_eq!(plan.encoder.frame_rate, 30);
        assert_eq!(plan.encoder.destination.url, DEFAULT_URL);
        assert_eq!(plan.pipeline.max_frames, 1000);
        assert_eq!(plan.pipeline.pacing, None);
        assert_eq!(plan.control, ControlKind::Prefix);
        assert_eq!(plan.control_summary(), "first 4 at 4.5");
    }

    #[test]
    fn flags_override_settings_file() {
        let settings = StreamSettings::from_json(
            r#"{"url": "rtsp://cam:8554/a", "width": 320, "frames": 50, "fps": 25, "control": "uniform"}"#,
        )
        .unwrap();
        let flags = Overrides {
            width: Some(160),
            height: Some(120),
            frames: Some(5),
            realtime: true,
            ..Overrides::default()
        };

        let plan = StreamPlan::resolve(settings, flags).unwrap();

        assert_eq!(plan.encoder.destination.url, "rtsp://cam:8554/a");
        assert_eq!(plan.encoder.input.video_size(), "160x120");
        assert_eq!(plan.pipeline.max_frames, 5);
        assert_eq!(plan.pipeline.pacing, Some(Duration::from_millis(40)));
        assert_eq!(plan.control, ControlKind::Uniform);
    }

    #[test]
    fn encoder_args_replace_generated_arguments() {
        let flags = Overrides {
            encoder: Some("sh".to_string()),
            encoder_args: vec!["-c".to_string(), "cat >/dev/null".to_string()],
            ..Overrides::default()
        };
        let plan = StreamPlan::resolve(StreamSettings::default(), flags).unwrap();
        assert_eq!(plan.encoder.command_line(), "sh -c 'cat >/dev/null'");
    }

    #[test]
    fn unknown_settings_fields_are_rejected() {
        let err = StreamSettings::from_json(r#"{"frame_count": 10}"#).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn inverted_control_range_is_rejected() {
        let settings =
            StreamSettings::from_json(r#"{"control_range": {"min": 5.0, "max": 1.0}}"#).unwrap();
        let err = StreamPlan::resolve(settings, Overrides::default()).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn zero_dimensions_are_a_usage_error() {
        let flags = Overrides {
            width: Some(0),
            ..Overrides::default()
        };
        let err = StreamPlan::resolve(StreamSettings::default(), flags).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn zero_fps_is_a_usage_error() {
        let flags = Overrides {
            fps: Some(0),
            ..Overrides::default()
        };
        let err = StreamPlan::resolve(StreamSettings::default(), flags).unwrap_err();
        assert_eq!(err.code, USAGE);
    }
}
