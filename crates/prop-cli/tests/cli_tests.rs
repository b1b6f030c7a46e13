//! Integration tests for the `plist` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise every subcommand
//! through the actual binary, including stdin/stdout piping, in-place edits,
//! JSON conversion and error reporting.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: path to the config.plist fixture.
fn config_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/config.plist")
}

/// Helper: copy the fixture into a fresh temp dir for in-place edits.
fn scratch_copy() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.plist");
    std::fs::copy(config_path(), &path).unwrap();
    (dir, path)
}

fn plist() -> Command {
    Command::cargo_bin("plist").unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// show / get / keys
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn show_reports_kind_and_count() {
    plist()
        .args(["show", "-i", config_path()])
        .assert()
        .success()
        .stdout("dict (3 entries)\n");
}

#[test]
fn show_reads_stdin() {
    plist()
        .arg("show")
        .write_stdin("<plist><array><integer>1</integer></array></plist>")
        .assert()
        .success()
        .stdout("array (1 entries)\n");
}

#[test]
fn get_scalar_through_array_index() {
    plist()
        .args(["get", "servers.0.port", "-i", config_path()])
        .assert()
        .success()
        .stdout("8080\n");
}

#[test]
fn get_container_prints_plist_document() {
    plist()
        .args(["get", "servers.0", "-i", config_path()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<?xml"))
        .stdout(predicate::str::contains("<key>host</key>"));
}

#[test]
fn get_missing_path_fails() {
    plist()
        .args(["get", "servers.5.port", "-i", config_path()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No value at path 'servers.5.port'"));
}

#[test]
fn keys_of_nested_dictionary() {
    plist()
        .args(["keys", "servers.0", "-i", config_path()])
        .assert()
        .success()
        .stdout(predicate::str::contains("debug"))
        .stdout(predicate::str::contains("host"))
        .stdout(predicate::str::contains("port"));
}

#[test]
fn keys_of_array_fails() {
    plist()
        .args(["keys", "servers", "-i", config_path()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No dictionary"));
}

// ─────────────────────────────────────────────────────────────────────────────
// set / remove
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn set_integer_in_place() {
    let (_dir, path) = scratch_copy();
    let file = path.to_str().unwrap();

    plist()
        .args(["set", "servers.0.port", "9090", "--kind", "integer", "-f", file])
        .assert()
        .success();

    plist()
        .args(["get", "servers.0.port", "-i", file])
        .assert()
        .success()
        .stdout("9090\n");
}

#[test]
fn set_at_array_count_appends() {
    let (_dir, path) = scratch_copy();
    let file = path.to_str().unwrap();

    plist()
        .args(["set", "servers.1", "backup", "-f", file])
        .assert()
        .success();

    plist()
        .args(["get", "servers.1", "-i", file])
        .assert()
        .success()
        .stdout("backup\n");
}

#[test]
fn set_past_array_count_fails() {
    let (_dir, path) = scratch_copy();
    let file = path.to_str().unwrap();

    plist()
        .args(["set", "servers.3", "x", "-f", file])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn set_rejects_bad_integer() {
    let (_dir, path) = scratch_copy();
    plist()
        .args(["set", "version", "four", "-k", "integer", "-f", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid integer"));
}

#[test]
fn remove_key_in_place() {
    let (_dir, path) = scratch_copy();
    let file = path.to_str().unwrap();

    plist()
        .args(["remove", "servers.0.debug", "-f", file])
        .assert()
        .success();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(!content.contains("<key>debug</key>"));
    assert!(content.contains("<key>host</key>"));
}

#[test]
fn remove_absent_key_succeeds() {
    let (_dir, path) = scratch_copy();
    plist()
        .args(["remove", "nothing_here", "-f", path.to_str().unwrap()])
        .assert()
        .success();
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON conversion
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn from_json_stdin_to_stdout() {
    plist()
        .arg("from-json")
        .write_stdin(r#"{"port":8080,"host":"localhost","tls":false}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("<key>port</key>"))
        .stdout(predicate::str::contains("<integer>8080</integer>"))
        .stdout(predicate::str::contains("<false/>"));
}

#[test]
fn from_json_rejects_null() {
    plist()
        .arg("from-json")
        .write_stdin(r#"{"a":null}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported value type"));
}

#[test]
fn from_json_rejects_scalar_root() {
    plist()
        .arg("from-json")
        .write_stdin("42")
        .assert()
        .failure()
        .stderr(predicate::str::contains("array or a dictionary"));
}

#[test]
fn to_json_matches_fixture() {
    let output = plist()
        .args(["to-json", "-i", config_path()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "name": "edge-proxy",
            "servers": [{"debug": true, "host": "localhost", "port": 8080}],
            "version": 3
        })
    );
}

#[test]
fn json_roundtrip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("config.json");
    let plist_path = dir.path().join("back.plist");

    plist()
        .args(["to-json", "-i", config_path(), "-o", json_path.to_str().unwrap()])
        .assert()
        .success();
    plist()
        .args([
            "from-json",
            "-i",
            json_path.to_str().unwrap(),
            "-o",
            plist_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let original = std::fs::read_to_string(config_path()).unwrap();
    let back = std::fs::read_to_string(&plist_path).unwrap();
    assert_eq!(original, back);
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn malformed_input_reports_line() {
    plist()
        .arg("show")
        .write_stdin("<plist>\n<array>\n<real>1.0</real>\n</array>\n</plist>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse plist"))
        .stderr(predicate::str::contains("line 3"));
}

#[test]
fn missing_input_file_fails() {
    plist()
        .args(["show", "-i", "/nonexistent/path/config.plist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load plist"))
        .stderr(predicate::str::contains("I/O error"));
}

#[test]
fn non_utf8_input_file_reports_malformed_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latin1.plist");
    let mut bytes = b"<plist>\n<array>\n<string>caf".to_vec();
    bytes.push(0xE9);
    bytes.extend_from_slice(b"</string>\n</array>\n</plist>\n");
    std::fs::write(&path, bytes).unwrap();

    plist()
        .args(["show", "-i"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed plist at line 3"))
        .stderr(predicate::str::contains("I/O error").not());
}

#[test]
fn to_json_rejects_nesting_beyond_json_limit() {
    let depth = 500;
    let xml = format!(
        "<plist>{}{}</plist>",
        "<array>".repeat(depth),
        "</array>".repeat(depth)
    );
    plist()
        .arg("to-json")
        .write_stdin(xml)
        .assert()
        .failure()
        .stderr(predicate::str::contains("500 levels deep"));
}

#[test]
fn show_handles_very_deep_document() {
    let depth = 50_000;
    let xml = format!(
        "<plist>{}{}</plist>",
        "<array>".repeat(depth),
        "</array>".repeat(depth)
    );
    plist()
        .arg("show")
        .write_stdin(xml)
        .assert()
        .success()
        .stdout("array (1 entries)\n");
}

#[test]
fn no_subcommand_prints_usage() {
    plist()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
