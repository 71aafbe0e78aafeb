//! CLI subprocess integration tests.
//!
//! These tests invoke the `caravel` binary as a subprocess and verify
//! exit codes, stdout content, and JSON output stability.

use std::process::Command;

fn caravel_bin(store: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_caravel"));
    cmd.arg("--store").arg(store);
    cmd
}

fn temp_store() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

#[test]
fn cli_version_exits_zero() {
    let output = Command::new(env!("CARGO_BIN_EXE_caravel"))
        .arg("--version")
        .output()
        .unwrap();
    assert!(output.status.success(), "caravel --version must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("caravel"));
}

#[test]
fn list_on_empty_store() {
    let store = temp_store();
    let output = caravel_bin(store.path()).arg("list").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("no applications registered"));
}

#[test]
fn register_then_list_json() {
    let store = temp_store();
    let output = caravel_bin(store.path())
        .args(["register", "my-app", "--cluster", "c1", "--name", "My App"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "register failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output = caravel_bin(store.path())
        .args(["list", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let apps: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("list --json must emit valid JSON");
    assert_eq!(apps[0]["slug"], "my-app");
    assert_eq!(apps[0]["auto_deploy"], "enabled");
}

#[test]
fn register_rejects_invalid_slug() {
    let store = temp_store();
    let output = caravel_bin(store.path())
        .args(["register", "My_App", "--cluster", "c1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn deploy_unknown_app_exits_not_found() {
    let store = temp_store();
    let output = caravel_bin(store.path())
        .args(["deploy", "ghost", "3"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn deploy_after_register_queues_intent() {
    let store = temp_store();
    let register = caravel_bin(store.path())
        .args(["register", "my-app", "--cluster", "c1"])
        .output()
        .unwrap();
    assert!(register.status.success());

    let deploy = caravel_bin(store.path())
        .args(["deploy", "my-app", "1"])
        .output()
        .unwrap();
    assert!(
        deploy.status.success(),
        "deploy failed: {}",
        String::from_utf8_lossy(&deploy.stderr)
    );

    let intents = caravel_bin(store.path())
        .args(["intents", "--json"])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&intents.stdout).unwrap();
    assert_eq!(json[0]["app_id"], "app-my-app");
    assert_eq!(json[0]["sequence"], 1);
}

#[test]
fn policy_flip_is_visible_in_status_listing() {
    let store = temp_store();
    caravel_bin(store.path())
        .args(["register", "my-app", "--cluster", "c1"])
        .output()
        .unwrap();

    let output = caravel_bin(store.path())
        .args(["policy", "my-app", "disabled"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let output = caravel_bin(store.path())
        .args(["list", "--json"])
        .output()
        .unwrap();
    let apps: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(apps[0]["auto_deploy"], "disabled");
}

#[test]
fn status_of_unknown_sequence_is_unknown() {
    let store = temp_store();
    caravel_bin(store.path())
        .args(["register", "my-app", "--cluster", "c1"])
        .output()
        .unwrap();

    let output = caravel_bin(store.path())
        .args(["status", "my-app", "9", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "unknown");
    assert_eq!(json["classification"], "current/future");
}
