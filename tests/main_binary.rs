//! Integration tests for the `saphyr-wire` binary (src/main.rs).
//!
//! These tests run the compiled binary and check exit codes and output. They are
//! disabled under Miri and WASI, which cannot spawn processes.
#![cfg(all(not(miri), not(target_os = "wasi")))]

use std::io::Write;
use std::process::Command;

/// Runs the binary with `args` and returns (stdout, stderr, exit code).
fn run_binary(args: &[&str]) -> (String, String, i32) {
    let bin = env!("CARGO_BIN_EXE_saphyr-wire");
    let output = Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute binary");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);
    (stdout, stderr, code)
}

fn yaml_file(text: &str) -> tempfile::NamedTempFile {
    let mut tmp = tempfile::Builder::new()
        .suffix(".yml")
        .tempfile()
        .expect("create temp file");
    write!(tmp, "{text}").unwrap();
    tmp
}

#[test]
fn help_flag_prints_usage_and_exits_zero() {
    for flag in ["--help", "-h"] {
        let (stdout, _stderr, code) = run_binary(&[flag]);
        assert_eq!(code, 0);
        assert!(stdout.contains("Usage:"), "stdout: {stdout}");
    }
}

#[test]
fn no_args_prints_usage_to_stderr_and_exits_one() {
    let (_stdout, stderr, code) = run_binary(&[]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Usage:"), "stderr: {stderr}");
}

#[test]
fn unknown_option_prints_error_and_exits_one() {
    let (_stdout, stderr, code) = run_binary(&["--bogus"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown option"), "stderr: {stderr}");
}

#[test]
fn extra_argument_prints_error_and_exits_one() {
    let (_stdout, stderr, code) = run_binary(&["file1.yaml", "file2.yaml"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unexpected extra argument"), "stderr: {stderr}");
}

#[test]
fn missing_file_prints_error_and_exits_two() {
    let (_stdout, stderr, code) = run_binary(&["nonexistent_file_12345.yaml"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("Failed to read"), "stderr: {stderr}");
}

#[test]
fn valid_file_prints_the_path_table() {
    let tmp = yaml_file("model:\n  layers: [64, 32]\nname: run\n");
    let path = tmp.path().to_str().unwrap();

    let (stdout, stderr, code) = run_binary(&[path]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert_eq!(stdout, "model.layers[0], 64\nmodel.layers[1], 32\nname, run\n");
}

#[test]
fn includes_are_expanded_before_printing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("optimizer.yml"), "lr: 0.1\n").unwrap();
    let main = dir.path().join("main.yml");
    std::fs::write(&main, "optimizer: optimizer.yml\n").unwrap();

    let (stdout, stderr, code) = run_binary(&[main.to_str().unwrap()]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert_eq!(stdout, "optimizer.lr, 0.1\n");
}

#[test]
fn budget_flag_prints_the_report() {
    let tmp = yaml_file("a: 1\n");
    let path = tmp.path().to_str().unwrap();

    let (_stdout, stderr, code) = run_binary(&["--budget", path]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stderr.contains("Budget report"), "stderr: {stderr}");
}

#[test]
fn budget_report_covers_the_main_document_only() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("optimizer.yml"), "lr: 0.1\n").unwrap();
    std::fs::write(dir.path().join("data.yml"), "batch: 32\n").unwrap();
    let main = dir.path().join("main.yml");
    std::fs::write(&main, "optimizer: optimizer.yml\ndata: '{{ data.yml }}'\n").unwrap();

    let (stdout, stderr, code) = run_binary(&["--budget", main.to_str().unwrap()]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert_eq!(stdout, "optimizer.lr, 0.1\ndata.batch, 32\n");
    assert_eq!(stderr.matches("Budget report").count(), 1, "stderr: {stderr}");
}

#[test]
fn invalid_file_exits_three() {
    let tmp = yaml_file("a: b: c:\n");
    let path = tmp.path().to_str().unwrap();

    let (_stdout, stderr, code) = run_binary(&[path]);
    assert_eq!(code, 3, "stderr: {stderr}");
    assert!(stderr.contains("invalid"), "stderr: {stderr}");
}
