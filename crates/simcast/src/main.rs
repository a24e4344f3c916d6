mod cmd;
mod exit;
mod logging;
mod output;
mod settings;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "simcast", version, about = "Stream a simulation as live video")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stream_subcommand() {
        let cli = Cli::try_parse_from([
            "simcast",
            "stream",
            "--url",
            "rtsp://localhost:8554/sim",
            "--frames",
            "10",
            "--control",
            "uniform",
            "--seed",
            "7",
        ])
        .expect("stream args should parse");

        match cli.command {
            Command::Stream(args) => {
                assert_eq!(args.frames, Some(10));
                assert_eq!(args.seed, Some(7));
                assert_eq!(args.url.as_deref(), Some("rtsp://localhost:8554/sim"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn encoder_args_accept_leading_hyphens() {
        let cli = Cli::try_parse_from([
            "simcast",
            "stream",
            "--encoder",
            "sh",
            "--encoder-arg",
            "-c",
            "--encoder-arg",
            "cat >/dev/null",
        ])
        .expect("hyphenated encoder args should parse");

        match cli.command {
            Command::Stream(args) => {
                assert_eq!(args.encoder_args, vec!["-c", "cat >/dev/null"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_transport() {
        let err = Cli::try_parse_from(["simcast", "stream", "--transport", "quic"])
            .expect_err("unknown transport should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_pixel_format() {
        let cli = Cli::try_parse_from([
            "simcast",
            "--format",
            "json",
            "stream",
            "--pixel-format",
            "bgra",
        ])
        .expect("pixel format should parse");
        match cli.command {
            Command::Stream(args) => {
                assert_eq!(args.pixel_format, Some(simcast_frame::PixelFormat::Bgra))
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
