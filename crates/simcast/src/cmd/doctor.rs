use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Serialize;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let located = locate_program(&args.encoder);
    let mut checks = vec![encoder_available_check(&args.encoder, located.as_deref())];
    checks.push(match &located {
        Some(path) => encoder_version_check(path),
        None => CheckResult::new("encoder_version", CheckStatus::Skip, "encoder not found"),
    });
    checks.push(pipe_delivery_check());
    checks.push(compiled_features_check());

    let has_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);
    let output = DoctorOutput {
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };

    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("simcast doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<18} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}

/// Resolve `program` the way `Command::new` would: as a path if it has a
/// separator, otherwise through `PATH`.
fn locate_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        let full = dir.join(program);
        if full.is_file() {
            return Some(full);
        }
        if cfg!(windows) {
            let exe = full.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

fn encoder_available_check(program: &str, located: Option<&Path>) -> CheckResult {
    match located {
        Some(path) => CheckResult::new(
            "encoder_available",
            CheckStatus::Pass,
            path.display().to_string(),
        ),
        None => CheckResult::new(
            "encoder_available",
            CheckStatus::Fail,
            format!("`{program}` not found on PATH"),
        ),
    }
}

fn encoder_version_check(path: &Path) -> CheckResult {
    let output = Command::new(path)
        .arg("-version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();
    match output {
        Ok(out) if out.status.success() => {
            let text = String::from_utf8_lossy(&out.stdout);
            let first = text.lines().next().unwrap_or("").trim().to_string();
            CheckResult::new("encoder_version", CheckStatus::Info, first)
        }
        Ok(out) => CheckResult::new(
            "encoder_version",
            CheckStatus::Warn,
            format!("`-version` exited with {}", out.status),
        ),
        Err(err) => CheckResult::new(
            "encoder_version",
            CheckStatus::Warn,
            format!("`-version` failed: {err}"),
        ),
    }
}

fn pipe_delivery_check() -> CheckResult {
    #[cfg(unix)]
    {
        use simcast_encoder::{EncoderConfig, EncoderProcess};
        use simcast_frame::{Frame, FrameFormat, PixelFormat};

        let probe = || -> Result<u64, String> {
            let input = FrameFormat::new(16, 16, PixelFormat::Rgb24).map_err(|e| e.to_string())?;
            let config = EncoderConfig {
                program: "sh".to_string(),
                input,
                args: Some(vec!["-c".to_string(), "cat >/dev/null".to_string()]),
                exit_timeout: Some(std::time::Duration::from_secs(5)),
                ..EncoderConfig::default()
            };
            let mut process = EncoderProcess::spawn(&config).map_err(|e| e.to_string())?;
            let frame = Frame::filled(input, 0x80).map_err(|e| e.to_string())?;
            for _ in 0..3 {
                process.write_frame(&frame).map_err(|e| e.to_string())?;
            }
            let written = process.frames_written();
            process.close().map_err(|e| e.to_string())?;
            Ok(written)
        };

        match probe() {
            Ok(frames) => CheckResult::new(
                "pipe_delivery",
                CheckStatus::Pass,
                format!("{frames} frames delivered to a child process"),
            ),
            Err(err) => CheckResult::new("pipe_delivery", CheckStatus::Fail, err),
        }
    }

    #[cfg(not(unix))]
    {
        CheckResult::new(
            "pipe_delivery",
            CheckStatus::Skip,
            "pipe probe uses `sh` and only runs on Unix",
        )
    }
}

fn compiled_features_check() -> CheckResult {
    let mut features = Vec::new();
    if cfg!(feature = "cli") {
        features.push("cli");
    }
    CheckResult::new("compiled_features", CheckStatus::Info, features.join(", "))
}
