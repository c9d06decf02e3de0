//! Integration tests for the operator CLI
//!
//! These run the built binary and only exercise paths that fail or exit
//! before a database connection is needed.

use std::process::Command;

fn cup_admin(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_cup_admin"))
        .args(args)
        .env_remove("DATABASE_URL")
        .output()
        .expect("failed to run cup_admin")
}

#[test]
fn test_help_lists_every_command() {
    let output = cup_admin(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in [
        "migrate", "fixtures", "schedule", "standings", "start", "result", "forfeit", "bracket",
    ] {
        assert!(stdout.contains(command), "help is missing {command}");
    }
}

#[test]
fn test_unknown_command_fails() {
    let output = cup_admin(&["reseed"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown command 'reseed'"));
}

#[test]
fn test_bad_score_fails_before_connecting() {
    let output = cup_admin(&["result", "--match", "1", "--score", "two-nil"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("result"));
}
