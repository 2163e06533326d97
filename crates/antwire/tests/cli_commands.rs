#![cfg(feature = "cli")]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "antwire-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn antwire(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_antwire"))
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("antwire should run")
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect()
}

#[test]
fn encode_prints_the_frame() {
    let output = antwire(&["--format", "json", "encode", "CHANNEL_ASSIGN", "00 00 00"]);

    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["name"], "CHANNEL_ASSIGN");
    assert_eq!(lines[0]["frame"], "A4 03 42 00 00 00 E5");
    assert_eq!(lines[0]["checksum"], 0xE5);
}

#[test]
fn encode_pretty_uses_the_pipe_layout() {
    let output = antwire(&["--format", "pretty", "encode", "SYSTEM_RESET"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "<SYSTEM_RESET A4|01|4A|00|EF>");
}

#[test]
fn encode_unknown_message_is_usage_error() {
    let output = antwire(&["encode", "NOT_A_MESSAGE"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn decode_reports_fields() {
    let output = antwire(&["--format", "json", "decode", "A4", "03", "40", "00", "42", "00", "A5"]);

    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines[0]["name"], "CHANNEL_EVENT");
    assert_eq!(lines[0]["channel"], 0);
    assert_eq!(lines[0]["fields"][0]["value"], "CHANNEL_ASSIGN");
}

#[test]
fn decode_bad_checksum_returns_60() {
    let output = antwire(&["decode", "A4 03 42 00 00 00 00"]);

    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bad checksum"));
}

#[test]
fn scan_recovers_messages_from_a_raw_file() {
    let dir = unique_temp_dir("scan");
    let path = dir.join("stream.bin");
    std::fs::write(
        &path,
        [
            0xA4, 0x01, 0x6F, 0x20, 0xEA, // startup
            0xA4, 0x03, 0x42, 0x00, 0x00, 0x00, 0x00, // corrupt
            0xA4, 0x03, 0x40, 0x00, 0x42, 0x00, 0xA5, // ack
        ],
    )
    .expect("stream file should be writable");

    let output = antwire(&[
        "--format",
        "json",
        "scan",
        path.to_str().expect("temp path should be utf-8"),
        "--chunk",
        "4",
    ]);

    assert!(output.status.success());
    let names: Vec<String> = json_lines(&output)
        .iter()
        .map(|line| line["name"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, vec!["STARTUP", "CHANNEL_EVENT"]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn scan_reads_hex_from_stdin() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_antwire"))
        .args(["--log-level", "error", "--format", "json", "scan", "-", "--hex"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("scan should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(b"A4 01 4A 00 EF\nA4 01 6F 20 EA\n")
        .expect("stdin should accept input");
    let output = child.wait_with_output().expect("scan should finish");

    assert!(output.status.success());
    assert_eq!(json_lines(&output).len(), 2);
}

#[test]
fn scan_stall_returns_60() {
    let dir = unique_temp_dir("stall");
    let path = dir.join("stream.bin");
    std::fs::write(&path, [0x00, 0x01, 0x4A, 0x00, 0x4B]).expect("stream file should be writable");

    let output = antwire(&["scan", path.to_str().expect("temp path should be utf-8")]);
    assert_eq!(output.status.code(), Some(60));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_decodes_capture_reads() {
    let dir = unique_temp_dir("replay");
    let path = dir.join("session.ant");
    std::fs::write(
        &path,
        "ANT-LOG\n\
         1700000000 EVENT_OPEN:\n\
         1700000000 EVENT_WRITE: A4 01 4A 00 EF\n\
         1700000001 EVENT_READ: A4 01 6F\n\
         1700000001 EVENT_READ: 20 EA\n\
         1700000001: A4 01 6F 20 EA\n",
    )
    .expect("capture should be writable");

    let output = antwire(&[
        "--format",
        "json",
        "replay",
        path.to_str().expect("temp path should be utf-8"),
    ]);

    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["name"], "STARTUP");
    assert_eq!(lines[0]["payload"], "20");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_rejects_foreign_files() {
    let dir = unique_temp_dir("foreign");
    let path = dir.join("notes.txt");
    std::fs::write(&path, "hello\n").expect("file should be writable");

    let output = antwire(&["replay", path.to_str().expect("temp path should be utf-8")]);
    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ANT-LOG"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_reports_package_version() {
    let output = antwire(&["version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("antwire {}", env!("CARGO_PKG_VERSION"))
    );
}
