// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Integration tests for the codescan CLI
//!
//! Every command runs against scenario files in tests/data, no camera
//! required.

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use std::{env, path::PathBuf};

/// Helper to create a Command for the codescan binary
/// Uses CODESCAN_BIN environment variable if set, otherwise uses cargo run
fn codescan_cmd() -> Command {
    if let Ok(bin_path) = env::var("CODESCAN_BIN") {
        Command::new(bin_path)
    } else {
        let mut c = Command::new("cargo");
        c.args(["run", "-q", "--bin", "codescan", "--"]);
        c
    }
}

fn scenario(name: &str) -> String {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "data", name]
        .iter()
        .collect();
    path.to_string_lossy().into_owned()
}

fn json_output(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().expect("Failed to run codescan");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn test_help_lists_commands() {
    codescan_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("devices"))
        .stdout(predicate::str::contains("formats"));
}

#[test]
fn test_scan_requires_scenario() {
    codescan_cmd()
        .arg("scan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--scenario"));
}

#[test]
fn test_formats_text() {
    codescan_cmd()
        .arg("formats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Recognized formats (9)"))
        .stdout(predicate::str::contains("qr_code"))
        .stdout(predicate::str::contains("matrix"));
}

#[test]
fn test_formats_json() {
    let value = json_output(codescan_cmd().args(["formats", "--json"]));
    let formats = value.as_array().unwrap();
    assert_eq!(formats.len(), 9);
    assert_eq!(formats[0]["name"], "ean_13");
    assert_eq!(formats[8]["kind"], "matrix");
}

#[test]
#[serial]
fn test_scan_prints_payload() {
    codescan_cmd()
        .args(["scan", "--scenario", &scenario("scan_success.json")])
        .assert()
        .success()
        .stdout(predicate::str::diff("4006381333931\n"));
}

#[test]
#[serial]
fn test_scan_json_report() {
    let value = json_output(codescan_cmd().args([
        "scan",
        "--json",
        "--scenario",
        &scenario("scan_success.json"),
    ]));
    assert_eq!(value["status"], "scanned");
    assert_eq!(value["payload"], "4006381333931");
    assert_eq!(value["state"], "completed");
    assert_eq!(value["handle"], 1);
    assert_eq!(value["acquisition"], "candidate 1");
    assert_eq!(value["tuning"], "continuous-focus");
}

#[test]
#[serial]
fn test_scan_without_hardware_uses_software() {
    let value = json_output(codescan_cmd().args([
        "scan",
        "--json",
        "--no-hardware",
        "--scenario",
        &scenario("scan_success.json"),
    ]));
    assert_eq!(value["source"], "software");
    assert_eq!(value["hardware_enabled"], false);
    assert_eq!(value["loops"]["hardware_ticks"], 0);
}

#[test]
#[serial]
fn test_scan_pins_back_camera() {
    let value = json_output(codescan_cmd().args([
        "scan",
        "--json",
        "--scenario",
        &scenario("pinned_back_camera.json"),
    ]));
    assert_eq!(value["payload"], "QR-PINNED");
    assert_eq!(value["acquisition"], "pinned device back-id");
}

#[test]
#[serial]
fn test_scan_stats_text() {
    codescan_cmd()
        .args(["scan", "--stats", "--scenario", &scenario("scan_success.json")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("4006381333931\n"))
        .stdout(predicate::str::contains("Acquisition:    candidate 1"));
}

#[test]
#[serial]
fn test_camera_denied_exit_code() {
    codescan_cmd()
        .args(["scan", "--scenario", &scenario("camera_denied.json")])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("NotAllowedError: Permission denied"));
}

#[test]
#[serial]
fn test_missing_container_exit_code() {
    codescan_cmd()
        .args([
            "scan",
            "--scenario",
            &scenario("scan_success.json"),
            "--container",
            "nowhere",
        ])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Scanner container 'nowhere' not found"));
}

#[test]
fn test_insecure_context_exit_code() {
    codescan_cmd()
        .args(["scan", "--scenario", &scenario("insecure.json")])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("secure"));
}

#[test]
#[serial]
fn test_timeout_exit_code() {
    codescan_cmd()
        .args([
            "scan",
            "--scenario",
            &scenario("blank_forever.json"),
            "--timeout",
            "0.5",
        ])
        .assert()
        .code(6)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No code scanned"));
}

#[test]
#[serial]
fn test_timeout_json_report() {
    let output = codescan_cmd()
        .args([
            "scan",
            "--json",
            "--scenario",
            &scenario("blank_forever.json"),
            "--timeout",
            "0.5",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["status"], "timeout");
    assert_eq!(value["state"], "stopped");
    assert!(value.get("payload").is_none());
    assert!(value["loops"]["empty_payloads"].as_u64().unwrap() > 0);
}

#[test]
fn test_invalid_timeout() {
    codescan_cmd()
        .args(["scan", "--scenario", &scenario("scan_success.json"), "--timeout", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Timeout must be a positive"));
}

#[test]
fn test_missing_scenario_file() {
    codescan_cmd()
        .args(["scan", "--scenario", "/nonexistent/scenario.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Cannot read scenario"));
}

#[test]
fn test_devices_marks_rear_camera() {
    codescan_cmd()
        .args(["devices", "--scenario", &scenario("pinned_back_camera.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Video inputs (2)"))
        .stdout(predicate::str::contains("* back-id: Back Camera"))
        .stdout(predicate::str::contains("Fallback pins: back-id"));
}

#[test]
fn test_devices_json() {
    let value = json_output(codescan_cmd().args([
        "devices",
        "--json",
        "--scenario",
        &scenario("pinned_back_camera.json"),
    ]));
    assert_eq!(value["selected"], "back-id");
    assert_eq!(value["devices"][0]["rear"], false);
    assert_eq!(value["devices"][1]["rear"], true);
}
