//! End-to-end runs of the `shape-search` binary.

use std::io::Write;
use std::process::{Command, Output};

use shape_search::schema::RunConfig;

fn run_with_config(config: &RunConfig, rust_log: Option<&str>) -> Output {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string(config).unwrap().as_bytes())
        .unwrap();

    let mut command = Command::new(env!("CARGO_BIN_EXE_shape-search"));
    command.arg(file.path());
    match rust_log {
        Some(filter) => command.env("RUST_LOG", filter),
        None => command.env_remove("RUST_LOG"),
    };
    command.output().unwrap()
}

#[test]
fn test_verbose_run_logs_rounds_by_default() {
    let output = run_with_config(&RunConfig::default(), None);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "stderr: {stderr}");
    assert!(stdout.contains("Stopped:"), "stdout: {stdout}");
    assert!(stderr.contains("Round 1/"), "stderr: {stderr}");
}

#[test]
fn test_rust_log_overrides_default_filter() {
    let output = run_with_config(&RunConfig::default(), Some("warn"));
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "stderr: {stderr}");
    assert!(!stderr.contains("Round 1/"), "stderr: {stderr}");
}

#[test]
fn test_missing_run_file_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_shape-search"))
        .arg("/nonexistent/run.json")
        .output()
        .unwrap();
    assert!(!output.status.success());
}
