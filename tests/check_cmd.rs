use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn cargo_bin() -> Command { Command::cargo_bin("bf").unwrap() }

#[test]
fn test_check_balanced_code() {
    cargo_bin()
        .args(["check", "a [ b [ c ] ] d"])
        .assert()
        .success()
        .stdout("ok (4 instructions)\n");
}

#[test]
fn test_check_file_with_stray_close() {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "+\n]\n").unwrap();
    cargo_bin()
        .arg("check").arg("--file").arg(tf.path())
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("unmatched ']' at position 2"));
}

#[test]
fn test_check_does_not_execute() {
    // A program that would fail at runtime is still structurally valid.
    cargo_bin()
        .args(["check", "<<<,"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));
}

#[test]
fn test_top_level_help_exits_zero() {
    cargo_bin()
        .arg("--help")
        .assert()
        .success()
        .stderr(predicate::str::contains("Usage:").and(predicate::str::contains("check")));
}

#[test]
fn test_check_code_starting_with_minus() {
    cargo_bin()
        .args(["check", "->+<"])
        .assert()
        .success()
        .stdout("ok (4 instructions)\n");
}
