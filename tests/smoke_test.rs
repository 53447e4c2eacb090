/// Smoke tests to verify the binary runs without panicking
use std::process::Command;

#[test]
fn binary_shows_help() {
    let output = Command::new("cargo")
        .args(["run", "--", "--help"])
        .output()
        .expect("Failed to execute cargo run");

    assert!(
        output.status.success(),
        "Binary failed to run --help: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("cablemap"),
        "Help output should mention cablemap"
    );
}

#[test]
fn binary_shows_version() {
    let output = Command::new("cargo")
        .args(["run", "--", "--version"])
        .output()
        .expect("Failed to execute cargo run");

    assert!(
        output.status.success(),
        "Binary failed to run --version: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn invalid_subcommand_fails_gracefully() {
    let output = Command::new("cargo")
        .args(["run", "--", "nonexistent-command"])
        .output()
        .expect("Failed to execute cargo run");

    // Should fail with error, not panic
    assert!(
        !output.status.success(),
        "Invalid subcommand should return error status"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    // Should show helpful error, not a panic backtrace
    assert!(
        !stderr.contains("panicked at"),
        "Invalid subcommand should not cause panic"
    );
}

#[test]
fn mode_subcommand_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.toml");
    let state = state.to_str().unwrap();

    let set = Command::new("cargo")
        .args(["run", "--", "mode", "focus", "--state", state])
        .output()
        .expect("Failed to execute cargo run");
    assert!(set.status.success(), "{}", String::from_utf8_lossy(&set.stderr));

    let get = Command::new("cargo")
        .args(["run", "--", "mode", "--state", state])
        .output()
        .expect("Failed to execute cargo run");
    assert_eq!(String::from_utf8_lossy(&get.stdout).trim(), "Nigeria Focus");
}
