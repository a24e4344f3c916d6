use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use simcast_pipeline::{CloseStatus, RunReport};

use crate::settings::StreamPlan;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ErrorOutput {
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    iteration: Option<u64>,
}

#[derive(Serialize)]
struct RunOutput<'a> {
    status: &'static str,
    frames_delivered: u64,
    elapsed_ms: u128,
    close: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorOutput>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    secondary: &'a [String],
    #[serde(skip_serializing_if = "str::is_empty")]
    diagnostics: &'a str,
}

impl<'a> RunOutput<'a> {
    fn from_report(report: &'a RunReport) -> Self {
        let (close, exit_code) = match &report.close {
            CloseStatus::NotAttempted => ("not_attempted", None),
            CloseStatus::Clean(exit) => ("clean", exit.code),
            CloseStatus::Failed(_) => ("failed", None),
        };
        Self {
            status: report.status(),
            frames_delivered: report.frames_delivered,
            elapsed_ms: report.elapsed.as_millis(),
            close,
            exit_code,
            error: report.error().map(|err| ErrorOutput {
                kind: err.kind(),
                message: err.to_string(),
                iteration: err.iteration(),
            }),
            secondary: &report.secondary,
            diagnostics: report.diagnostics.trim_end(),
        }
    }
}

pub fn print_report(report: &RunReport, format: OutputFormat) {
    let out = RunOutput::from_report(report);
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut rows = vec![
                ("STATUS", out.status.to_string()),
                ("FRAMES", out.frames_delivered.to_string()),
                ("ELAPSED", format!("{} ms", out.elapsed_ms)),
                ("ENCODER", close_text(&out)),
            ];
            if let Some(err) = &out.error {
                rows.push(("ERROR", err.message.clone()));
            }
            for message in out.secondary {
                rows.push(("ALSO", message.clone()));
            }
            if !out.diagnostics.is_empty() {
                rows.push(("DIAGNOSTICS", out.diagnostics.to_string()));
            }
            println!("{}", table(rows));
        }
        OutputFormat::Pretty => {
            println!(
                "{} frames={} elapsed={}ms encoder={}",
                out.status,
                out.frames_delivered,
                out.elapsed_ms,
                close_text(&out)
            );
            if let Some(err) = &out.error {
                println!("  error: {}", err.message);
            }
            for message in out.secondary {
                println!("  also: {message}");
            }
            if !out.diagnostics.is_empty() {
                println!("  encoder output:");
                for line in out.diagnostics.lines() {
                    println!("    {line}");
                }
            }
        }
    }
}

fn close_text(out: &RunOutput<'_>) -> String {
    match (out.close, out.exit_code) {
        ("clean", Some(code)) => format!("exit {code}"),
        (close, _) => close.replace('_', " "),
    }
}

#[derive(Serialize)]
struct PlanOutput {
    program: String,
    args: Vec<String>,
    command_line: String,
    video_size: String,
    pixel_format: String,
    frame_rate: u32,
    frames: u64,
    realtime: bool,
    bodies: usize,
    control: String,
}

pub fn print_plan(plan: &StreamPlan, format: OutputFormat) {
    let out = PlanOutput {
        program: plan.encoder.program.clone(),
        args: plan.encoder.command_args(),
        command_line: plan.encoder.command_line(),
        video_size: plan.encoder.input.video_size(),
        pixel_format: plan.encoder.input.pixel_format.to_string(),
        frame_rate: plan.encoder.frame_rate,
        frames: plan.pipeline.max_frames,
        realtime: plan.pipeline.pacing.is_some(),
        bodies: plan.bodies,
        control: plan.control_summary(),
    };
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let rows = vec![
                ("COMMAND", out.command_line),
                (
                    "INPUT",
                    format!("{} {} @ {} fps", out.video_size, out.pixel_format, out.frame_rate),
                ),
                ("FRAMES", out.frames.to_string()),
                ("REALTIME", out.realtime.to_string()),
                ("BODIES", out.bodies.to_string()),
                ("CONTROL", out.control),
            ];
            println!("{}", table(rows));
        }
        OutputFormat::Pretty => {
            println!("{}", out.command_line);
            println!(
                "  {} {} @ {} fps, {} frames, {} bodies, control: {}",
                out.video_size,
                out.pixel_format,
                out.frame_rate,
                out.frames,
                out.bodies,
                out.control
            );
        }
    }
}

fn table(rows: Vec<(&str, String)>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["FIELD", "VALUE"]);
    for (field, value) in rows {
        table.add_row(vec![field.to_string(), value]);
    }
    table
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use simcast_encoder::{EncoderError, ExitReport};
    use simcast_pipeline::{PipelineError, RunOutcome};

    use super::*;

    #[test]
    fn completed_report_serializes_without_error_fields() {
        let report = RunReport {
            outcome: RunOutcome::Completed,
            frames_delivered: 3,
            close: CloseStatus::Clean(ExitReport::from_code(0)),
            secondary: Vec::new(),
            diagnostics: String::new(),
            elapsed: Duration::from_millis(12),
        };

        let json = serde_json::to_string(&RunOutput::from_report(&report)).unwrap();

        assert_eq!(
            json,
            r#"{"status":"completed","frames_delivered":3,"elapsed_ms":12,"close":"clean","exit_code":0}"#
        );
    }

    #[test]
    fn failed_report_carries_kind_iteration_and_diagnostics() {
        let report = RunReport {
            outcome: RunOutcome::Failed(PipelineError::Delivery {
                iteration: 2,
                source: EncoderError::ChannelClosed,
                diagnostics: "Connection refused\n".to_string(),
            }),
            frames_delivered: 1,
            close: CloseStatus::Failed("encoder exited abnormally (exit code 1)".to_string()),
            secondary: vec!["encoder close failed: exit code 1".to_string()],
            diagnostics: "Connection refused\n".to_string(),
            elapsed: Duration::from_millis(5),
        };

        let value = serde_json::to_value(RunOutput::from_report(&report)).unwrap();

        assert_eq!(value["status"], "delivery_error");
        assert_eq!(value["error"]["kind"], "delivery_error");
        assert_eq!(value["error"]["iteration"], 2);
        assert_eq!(value["close"], "failed");
        assert_eq!(value["diagnostics"], "Connection refused");
        assert_eq!(value["secondary"].as_array().map(Vec::len), Some(1));
    }
}
