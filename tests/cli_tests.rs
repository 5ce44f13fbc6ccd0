//! # CLI Integration Tests / CLI 集成测试
//!
//! Drives the compiled binary end to end: argument surface, run resolution
//! failures, and a full refresh of an already-settled run that needs no remote
//! calls at all.
//!
//! 端到端驱动编译出的二进制：参数表面、运行解析失败，
//! 以及对已全部完成的运行进行完整刷新（完全不需要远程调用）。

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const RESULTS_ROOT_ENV: &str = "MATRIX_RESULTS_ROOT";

fn orchestrator(results_root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("matrix-orchestrator").unwrap();
    // Pin the locale so assertions see English messages regardless of host.
    cmd.env(RESULTS_ROOT_ENV, results_root);
    cmd.arg("--lang").arg("en");
    cmd
}

/// Seeds a run directory holding one settled, already-downloaded matrix.
/// 预置一个运行目录，其中包含一个已完成且已下载的矩阵。
fn seed_settled_run(results_root: &Path) -> std::path::PathBuf {
    let run_path = results_root.join("2026-08-30_10-00-00.000");
    fs::create_dir_all(&run_path).unwrap();
    fs::write(
        run_path.join("android_args.json"),
        r#"{
  "platform": "android",
  "project": "demo-project",
  "app": "app.apk",
  "test": "app-test.apk"
}"#,
    )
    .unwrap();
    fs::write(
        run_path.join("matrix_ids.json"),
        r#"{
  "matrix-1": {
    "matrix_id": "matrix-1",
    "state": "FINISHED",
    "web_link": "https://console.example.com/matrix-1",
    "gcs_bucket": "results-bucket",
    "gcs_path": "run/matrix-1/",
    "downloaded": true
  }
}"#,
    )
    .unwrap();
    run_path
}

#[test]
fn test_help_lists_subcommands() {
    let root = TempDir::new().unwrap();
    orchestrator(root.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("run")
                .and(predicate::str::contains("refresh"))
                .and(predicate::str::contains("cancel")),
        );
}

#[test]
fn test_no_subcommand_shows_help_and_fails() {
    let root = TempDir::new().unwrap();
    orchestrator(root.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_run_requires_config_argument() {
    let root = TempDir::new().unwrap();
    orchestrator(root.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--config"));
}

#[test]
fn test_run_with_missing_config_file_fails() {
    let root = TempDir::new().unwrap();
    orchestrator(root.path())
        .arg("run")
        .arg("-c")
        .arg(root.path().join("no_such_config.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read run config"));
}

#[test]
fn test_run_with_malformed_config_file_fails() {
    let root = TempDir::new().unwrap();
    let config = root.path().join("bad.json");
    fs::write(&config, "{ not json").unwrap();
    orchestrator(root.path())
        .arg("run")
        .arg("-c")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse run config"));
}

#[test]
fn test_refresh_without_previous_run_fails() {
    let root = TempDir::new().unwrap();
    orchestrator(root.path())
        .arg("refresh")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_cancel_without_previous_run_fails() {
    let root = TempDir::new().unwrap();
    orchestrator(root.path())
        .arg("cancel")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_refresh_of_unrecognized_run_directory_fails() {
    let root = TempDir::new().unwrap();
    // A directory without a platform args file cannot be resumed.
    fs::create_dir_all(root.path().join("2026-08-30_09-00-00.000")).unwrap();
    orchestrator(root.path())
        .arg("refresh")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_refresh_of_settled_run_reports_and_exits_zero() {
    let root = TempDir::new().unwrap();
    let run_path = seed_settled_run(root.path());

    // Every matrix is terminal and downloaded already, so the whole
    // refresh → poll → fetch → report pipeline completes without any
    // remote call and exits successfully.
    orchestrator(root.path())
        .arg("refresh")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("matrix-1")
                .and(predicate::str::contains("FINISHED")),
        );

    assert!(run_path.join("matrix_report.html").is_file());
}

#[test]
fn test_cancel_of_settled_run_is_a_noop() {
    let root = TempDir::new().unwrap();
    seed_settled_run(root.path());

    orchestrator(root.path()).arg("cancel").assert().success();
}
