use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command;

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir.parent().unwrap().parent().unwrap().to_path_buf()
}

#[test]
fn runs_factorial_demo() {
    let root = workspace_root();
    let mut cmd = Command::cargo_bin("kaze").unwrap();
    cmd.arg(root.join("demos/factorial.kaze"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("fact(5) = 120"));
}

#[test]
fn runs_fizzbuzz_demo() {
    let root = workspace_root();
    let mut cmd = Command::cargo_bin("kaze").unwrap();
    cmd.arg(root.join("demos/fizzbuzz.kaze"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("FizzBuzz"));
}

#[test]
fn runs_scoreboard_demo() {
    let root = workspace_root();
    let mut cmd = Command::cargo_bin("kaze").unwrap();
    cmd.arg(root.join("demos/scoreboard.kaze"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("total: 45"));
}

#[test]
fn parse_error_is_nonzero() {
    let bad = "fun x(\n"; // malformed on purpose
    let tmp_dir = tempfile::tempdir().unwrap();
    let bad_path = tmp_dir.path().join("bad.kaze");
    std::fs::write(&bad_path, bad).unwrap();

    let mut cmd = Command::cargo_bin("kaze").unwrap();
    cmd.arg(bad_path);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("parse error"));
}

#[test]
fn runtime_error_is_nonzero() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("boom.kaze");
    std::fs::write(&path, "1 / 0;\n").unwrap();

    let mut cmd = Command::cargo_bin("kaze").unwrap();
    cmd.arg(path);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("division by zero"));
}

#[test]
fn missing_file_is_nonzero() {
    let mut cmd = Command::cargo_bin("kaze").unwrap();
    cmd.arg("no-such-script.kaze");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}
