//! Smoke tests to verify command wiring
//!
//! None of these reach a database.

use assert_cmd::Command;
use predicates::prelude::*;

fn student_db() -> Command {
    let mut cmd = Command::cargo_bin("student-db").unwrap();
    cmd.env_remove("DB_PORT");
    cmd
}

#[test]
fn test_top_level_help_lists_commands() {
    student_db()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("checkgpa"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_generate_help() {
    student_db()
        .args(["generate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--locale"));
}

#[test]
fn test_generate_dry_run_needs_no_database() {
    student_db()
        .args(["generate", "--count", "3", "--seed", "7", "--dry-run"])
        .env("DB_HOST", "unreachable.invalid")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"student_id\": \"S"))
        .stdout(predicate::str::contains("Dry run: 3 valid students generated"));
}

#[test]
fn test_generate_dry_run_is_reproducible() {
    let run = || {
        student_db()
            .args(["generate", "-n", "2", "--seed", "42", "--locale", "en_US", "--dry-run"])
            .output()
            .unwrap()
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn test_generate_rejects_unknown_locale() {
    student_db()
        .args(["generate", "--locale", "fr_FR", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fr_FR"));
}

#[test]
fn test_generate_rejects_zero_count() {
    student_db()
        .args(["generate", "--count", "0", "--dry-run"])
        .assert()
        .failure();
}

#[test]
fn test_checkgpa_limit_bounds() {
    student_db()
        .args(["checkgpa", "--limit", "500"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("500"));
}

#[test]
fn test_show_requires_student_id() {
    student_db().arg("show").assert().failure();
}

#[test]
fn test_bad_port_is_reported() {
    student_db()
        .arg("stats")
        .env("DB_PORT", "not-a-port")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DB_PORT"));
}

#[test]
fn test_serve_help() {
    student_db()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--cors-permissive"));
}

#[test]
fn test_completions_bash() {
    student_db()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("student-db"));
}
