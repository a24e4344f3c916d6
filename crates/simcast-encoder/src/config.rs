use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use simcast_frame::FrameFormat;

use crate::error::{EncoderError, Result};

/// Default bytes of encoder stderr retained for failure reports: 16 KiB.
pub const DEFAULT_DIAGNOSTICS_CAPACITY: usize = 16 * 1024;

/// Default encoder program, resolved through `PATH`.
pub const DEFAULT_PROGRAM: &str = "ffmpeg";

/// Default output URL (a local RTSP server such as MediaMTX).
pub const DEFAULT_URL: &str = "rtsp://localhost:8554/mystream";

/// Lower transport used when publishing over RTSP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RtspTransport {
    #[default]
    Tcp,
    Udp,
}

impl RtspTransport {
    pub const fn as_str(self) -> &'static str {
        match self {
            RtspTransport::Tcp => "tcp",
            RtspTransport::Udp => "udp",
        }
    }
}

impl fmt::Display for RtspTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RtspTransport {
    type Err = EncoderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(RtspTransport::Tcp),
            "udp" => Ok(RtspTransport::Udp),
            other => Err(EncoderError::InvalidConfig(format!(
                "unknown transport `{other}` (expected tcp or udp)"
            ))),
        }
    }
}

/// Where the encoded stream goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Output URL handed to the encoder.
    pub url: String,
    /// Output container / muxer name (`-f`).
    pub container: String,
    /// RTSP lower transport; ignored for other containers.
    pub transport: RtspTransport,
}

impl Default for Destination {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            container: "rtsp".to_string(),
            transport: RtspTransport::Tcp,
        }
    }
}

/// Everything needed to start one encoder process.
///
/// Passed explicitly to [`EncoderProcess::spawn`](crate::EncoderProcess::spawn);
/// nothing about the stream is held in global state.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    /// Encoder executable.
    pub program: String,
    /// Layout and size of the raw frames written to stdin.
    pub input: FrameFormat,
    /// Declared input frame rate.
    pub frame_rate: u32,
    /// Encoded stream destination.
    pub destination: Destination,
    /// Video codec (`-c:v`).
    pub codec: String,
    /// Pixel format of the encoded stream (`-pix_fmt`).
    pub output_pixel_format: String,
    pub preset: Option<String>,
    pub tune: Option<String>,
    /// Full argument list override. When set, no arguments are generated.
    pub args: Option<Vec<String>>,
    /// Bound on how long one frame may wait for the encoder to drain its input.
    pub write_timeout: Option<Duration>,
    /// Bound on how long `close()` waits for exit before killing the process.
    pub exit_timeout: Option<Duration>,
    /// Bytes of stderr kept for diagnostics.
    pub diagnostics_capacity: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            input: FrameFormat::default(),
            frame_rate: 30,
            destination: Destination::default(),
            codec: "libx264".to_string(),
            output_pixel_format: "yuv420p".to_string(),
            preset: Some("ultrafast".to_string()),
            tune: Some("zerolatency".to_string()),
            args: None,
            write_timeout: None,
            exit_timeout: None,
            diagnostics_capacity: DEFAULT_DIAGNOSTICS_CAPACITY,
        }
    }
}

impl EncoderConfig {
    /// Check that the configuration can describe a runnable process.
    pub fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(EncoderError::InvalidConfig(
                "encoder program is empty".to_string(),
            ));
        }
        self.input
            .validate()
            .map_err(|err| EncoderError::InvalidConfig(err.to_string()))?;
        if self.frame_rate == 0 {
            return Err(EncoderError::InvalidConfig(
                "frame rate must be greater than zero".to_string(),
            ));
        }
        if self.args.is_none() && self.destination.url.trim().is_empty() {
            return Err(EncoderError::InvalidConfig(
                "destination url is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Interval between frames at the declared rate.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }

    /// Arguments passed to the encoder program.
    pub fn command_args(&self) -> Vec<String> {
        if let Some(args) = &self.args {
            return args.clone();
        }

        let mut args: Vec<String> = [
            "-hide_banner",
            "-nostats",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pixel_format",
            self.input.pixel_format.ffmpeg_name(),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.extend([
            "-video_size".to_string(),
            self.input.video_size(),
            "-framerate".to_string(),
            self.frame_rate.to_string(),
            "-i".to_string(),
            "pipe:".to_string(),
            "-c:v".to_string(),
            self.codec.clone(),
            "-pix_fmt".to_string(),
            self.output_pixel_format.clone(),
        ]);
        if let Some(preset) = &self.preset {
            args.extend(["-preset".to_string(), preset.clone()]);
        }
        if let Some(tune) = &self.tune {
            args.extend(["-tune".to_string(), tune.clone()]);
        }
        args.extend(["-f".to_string(), self.destination.container.clone()]);
        if self.destination.container == "rtsp" {
            args.extend([
                "-rtsp_transport".to_string(),
                self.destination.transport.to_string(),
            ]);
        }
        args.push(self.destination.url.clone());
        args
    }

    /// The full command line, for logs and dry runs.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in self.command_args() {
            line.push(' ');
            if arg.contains(char::is_whitespace) {
                line.push('\'');
                line.push_str(&arg);
                line.push('\'');
            } else {
                line.push_str(&arg);
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use simcast_frame::PixelFormat;

    use super::*;

    fn position(args: &[String], flag: &str) -> usize {
        args.iter()
            .position(|arg| arg == flag)
            .unwrap_or_else(|| panic!("{flag} missing from {args:?}"))
    }

    #[test]
    fn default_args_describe_raw_input_and_rtsp_output() {
        let args = EncoderConfig::default().command_args();

        assert_eq!(args[position(&args, "-pixel_format") + 1], "rgb24");
        assert_eq!(args[position(&args, "-video_size") + 1], "640x480");
        assert_eq!(args[position(&args, "-framerate") + 1], "30");
        assert_eq!(args[position(&args, "-i") + 1], "pipe:");
        assert_eq!(args[position(&args, "-c:v") + 1], "libx264");
        assert_eq!(args[position(&args, "-rtsp_transport") + 1], "tcp");
        assert_eq!(args.last().map(String::as_str), Some(DEFAULT_URL));
        assert!(args.iter().any(|arg| arg == "-nostats"));
    }

    #[test]
    fn input_options_precede_input() {
        let args = EncoderConfig::default().command_args();
        assert!(position(&args, "-video_size") < position(&args, "-i"));
        assert!(position(&args, "-i") < position(&args, "-c:v"));
    }

    #[test]
    fn non_rtsp_container_omits_transport() {
        let config = EncoderConfig {
            destination: Destination {
                url: "udp://127.0.0.1:5000".to_string(),
                container: "mpegts".to_string(),
                transport: RtspTransport::Udp,
            },
            preset: None,
            tune: None,
            ..EncoderConfig::default()
        };
        let args = config.command_args();
        assert!(!args.iter().any(|a| a == "-rtsp_transport"));
        assert!(!args.iter().any(|a| a == "-preset"));
        assert_eq!(args[args.len() - 2], "mpegts");
    }

    #[test]
    fn explicit_args_replace_generated_ones() {
        let config = EncoderConfig {
            program: "sh".to_string(),
            args: Some(vec!["-c".to_string(), "cat >/dev/null".to_string()]),
            ..EncoderConfig::default()
        };
        assert_eq!(config.command_args(), vec!["-c", "cat >/dev/null"]);
        assert_eq!(config.command_line(), "sh -c 'cat >/dev/null'");
    }

    #[test]
    fn input_format_flows_into_args() {
        let config = EncoderConfig {
            input: FrameFormat::new(32, 24, PixelFormat::Bgra).unwrap(),
            frame_rate: 60,
            ..EncoderConfig::default()
        };
        let args = config.command_args();
        assert_eq!(args[position(&args, "-pixel_format") + 1], "bgra");
        assert_eq!(args[position(&args, "-video_size") + 1], "32x24");
        assert_eq!(config.frame_interval(), Duration::from_secs(1) / 60);
    }

    #[test]
    fn validate_rejects_unusable_configs() {
        let empty_program = EncoderConfig {
            program: "  ".to_string(),
            ..EncoderConfig::default()
        };
        assert!(matches!(
            empty_program.validate(),
            Err(EncoderError::InvalidConfig(_))
        ));

        let zero_rate = EncoderConfig {
            frame_rate: 0,
            ..EncoderConfig::default()
        };
        assert!(zero_rate.validate().is_err());

        assert!(EncoderConfig::default().validate().is_ok());
    }

    #[test]
    fn transport_parses_case_insensitively() {
        assert_eq!("UDP".parse::<RtspTransport>().unwrap(), RtspTransport::Udp);
        assert!("quic".parse::<RtspTransport>().is_err());
        let json = serde_json::to_string(&RtspTransport::Tcp).unwrap();
        assert_eq!(json, "\"tcp\"");
    }
}
