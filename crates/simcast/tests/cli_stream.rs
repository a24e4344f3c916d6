#![cfg(all(unix, feature = "cli"))]

use std::path::PathBuf;
use std::process::{Command, Output};

fn simcast(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_simcast"))
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .env_remove("SIMCAST_ENCODER")
        .env_remove("SIMCAST_URL")
        .output()
        .expect("simcast should run")
}

fn unique_temp_file(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "simcast-{tag}-{}-{}.json",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ))
}

#[test]
fn stream_into_draining_encoder_completes() {
    let output = simcast(&[
        "stream",
        "--encoder",
        "sh",
        "--encoder-arg=-c",
        "--encoder-arg",
        "cat >/dev/null",
        "--frames",
        "3",
        "--width",
        "32",
        "--height",
        "24",
    ]);

    assert_eq!(output.status.code(), Some(0), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"status\":\"completed\""));
    assert!(stdout.contains("\"frames_delivered\":3"));
}

#[test]
fn missing_encoder_exits_with_spawn_code() {
    let output = simcast(&[
        "stream",
        "--encoder",
        "simcast-test-missing-encoder",
        "--frames",
        "3",
    ]);

    assert_eq!(output.status.code(), Some(4), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"kind\":\"spawn_error\""));
}

#[test]
fn encoder_that_dies_exits_with_delivery_code() {
    let output = simcast(&[
        "stream",
        "--encoder",
        "sh",
        "--encoder-arg=-c",
        "--encoder-arg",
        "echo 'rtsp: Connection refused' >&2; exit 1",
        "--frames",
        "200",
    ]);

    assert_eq!(output.status.code(), Some(3), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"kind\":\"delivery_error\""));
    assert!(stdout.contains("Connection refused"));
}

#[test]
fn dry_run_prints_generated_ffmpeg_command() {
    let output = simcast(&[
        "stream",
        "--dry-run",
        "--url",
        "rtsp://localhost:8554/sim",
        "--transport",
        "udp",
    ]);

    assert_eq!(output.status.code(), Some(0), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"program\":\"ffmpeg\""));
    assert!(stdout.contains("-rtsp_transport udp rtsp://localhost:8554/sim"));
}

#[test]
fn settings_file_is_applied_and_validated() {
    let path = unique_temp_file("settings");
    std::fs::write(&path, r#"{"width": 80, "height": 60, "fps": 10}"#)
        .expect("settings should be writable");
    let config = path.to_string_lossy().into_owned();

    let output = simcast(&["stream", "--dry-run", "--config", &config]);
    assert_eq!(output.status.code(), Some(0), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"video_size\":\"80x60\""));
    assert!(stdout.contains("\"frame_rate\":10"));

    std::fs::write(&path, r#"{"widht": 80}"#).expect("settings should be writable");
    let output = simcast(&["stream", "--dry-run", "--config", &config]);
    assert_eq!(output.status.code(), Some(60), "{output:?}");

    let _ = std::fs::remove_file(&path);
}

#[test]
fn invalid_duration_is_a_usage_error() {
    let output = simcast(&["stream", "--dry-run", "--write-timeout", "soon"]);
    assert_eq!(output.status.code(), Some(64), "{output:?}");
}

#[test]
fn version_prints_package_version() {
    let output = simcast(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("simcast {}", env!("CARGO_PKG_VERSION")));
}
