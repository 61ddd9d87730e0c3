//! CLI binary smoke tests using assert_cmd.
//!
//! These tests exercise the compiled `mtmkl` binary to verify that
//! argument parsing, help text, and an end-to-end train/predict/score run
//! work as expected.

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("mtmkl").unwrap()
}

fn write_dataset(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("train.csv");
    let mut content = String::from("f1,f2,label\n");
    let rows = [
        (0.0, 0.1, 0),
        (0.2, -0.1, 0),
        (-0.1, 0.0, 0),
        (0.1, 0.2, 0),
        (3.0, 3.1, 1),
        (3.2, 2.9, 1),
        (2.9, 3.0, 1),
        (3.1, 3.2, 1),
    ];
    for (a, b, label) in rows {
        content.push_str(&format!("{},{},{}\n", a, b, label));
    }
    std::fs::write(&path, content).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("predict"))
        .stdout(predicate::str::contains("score"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mtmkl"));
}

// ---------------------------------------------------------------------------
// Train subcommand
// ---------------------------------------------------------------------------

#[test]
fn train_no_config_prints_template() {
    cmd()
        .arg("train")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"train_data\""))
        .stdout(predicate::str::contains("\"degenerate_policy\""))
        .stderr(predicate::str::contains("No config file provided"));
}

#[test]
fn train_nonexistent_config_errors() {
    cmd()
        .args(["train", "/nonexistent/config.json"])
        .assert()
        .failure();
}

// ---------------------------------------------------------------------------
// Predict / score subcommands
// ---------------------------------------------------------------------------

#[test]
fn predict_requires_model() {
    cmd()
        .args(["predict", "-d", "data.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--model"));
}

#[test]
fn score_nonexistent_model_errors() {
    cmd()
        .args(["score", "-m", "/nonexistent/model.json", "-d", "/nonexistent/data.csv"])
        .assert()
        .failure();
}

#[test]
fn train_predict_score_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_dataset(dir.path());
    let model = dir.path().join("model.json");
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{"model": {"kernels": ["linear", "rbf"], "cv_folds": 2}}"#).unwrap();

    cmd()
        .args(["train", config.to_str().unwrap()])
        .args(["-d", data.to_str().unwrap()])
        .args(["-o", model.to_str().unwrap()])
        .assert()
        .success();
    assert!(model.exists());

    cmd()
        .args(["predict", "-m", model.to_str().unwrap(), "-d", data.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("prediction,proba_0,proba_1"));

    cmd()
        .args(["score", "-m", model.to_str().unwrap(), "-d", data.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("accuracy\t1.0000"))
        .stdout(predicate::str::contains("majority_baseline\t0.5000"));
}
