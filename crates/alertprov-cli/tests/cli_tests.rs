//! CLI integration tests
//!
//! Drive the `alertprov` binary against a scratch database and check its JSON
//! output and exit status.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn run(temp_dir: &TempDir, args: &[&str]) -> Output {
    let db_path = temp_dir.path().join("store.db");
    Command::new(env!("CARGO_BIN_EXE_alertprov"))
        .current_dir(temp_dir.path())
        .args(args)
        .arg("--db")
        .arg(&db_path)
        .output()
        .expect("Failed to execute CLI")
}

fn run_ok(temp_dir: &TempDir, args: &[&str]) -> Value {
    let output = run(temp_dir, args);
    assert!(
        output.status.success(),
        "CLI command {:?} should succeed. Stderr: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn write_rule(dir: &Path, name: &str, rule: Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(&rule).unwrap()).unwrap();
    path
}

fn rule_json(title: &str, group: &str, interval: i64) -> Value {
    serde_json::json!({
        "orgId": 1,
        "title": title,
        "condition": "A",
        "ruleGroup": group,
        "intervalSeconds": interval,
        "for": 120,
        "data": [
            {"refId": "A", "relativeTimeRange": {"from": 600, "to": 0}, "model": {"expr": "up == 0"}}
        ]
    })
}

#[test]
fn test_cli_create_get_and_list() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_rule(temp_dir.path(), "rule.json", rule_json("cpu", "a", 60));

    let created = run_ok(
        &temp_dir,
        &["create", "--file", file.to_str().unwrap(), "--provenance", "api"],
    );
    let uid = created["uid"].as_str().unwrap().to_string();
    assert!(!uid.is_empty());
    assert_eq!(created["version"], 1);
    assert_eq!(created["intervalSeconds"], 60);
    assert_eq!(created["for"], 120);

    let read = run_ok(&temp_dir, &["get", "--org", "1", "--uid", &uid]);
    assert_eq!(read["title"], "cpu");
    assert_eq!(read["provenance"], "api");

    let listed = run_ok(&temp_dir, &["list", "--org", "1"]);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[test]
fn test_cli_update_conflict_exits_with_code() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_rule(temp_dir.path(), "rule.json", rule_json("owned", "a", 60));
    let created = run_ok(
        &temp_dir,
        &["create", "--file", file.to_str().unwrap(), "--provenance", "file"],
    );

    let mut changed = rule_json("changed", "a", 60);
    changed["uid"] = created["uid"].clone();
    let update_file = write_rule(temp_dir.path(), "update.json", changed);

    let output = run(
        &temp_dir,
        &[
            "update",
            "--file",
            update_file.to_str().unwrap(),
            "--provenance",
            "api",
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("ERR_PROVENANCE_CONFLICT"),
        "unexpected stderr: {}",
        stderr
    );

    let updated = run_ok(
        &temp_dir,
        &[
            "update",
            "--file",
            update_file.to_str().unwrap(),
            "--provenance",
            "file",
        ],
    );
    assert_eq!(updated["title"], "changed");
    assert_eq!(updated["version"], 2);
}

#[test]
fn test_cli_group_interval_flow() {
    let temp_dir = TempDir::new().unwrap();
    let first = write_rule(temp_dir.path(), "first.json", rule_json("test#4", "b", 60));
    run_ok(&temp_dir, &["create", "--file", first.to_str().unwrap()]);

    let result = run_ok(
        &temp_dir,
        &["update-group", "--org", "1", "--group", "b", "--interval", "120"],
    );
    assert_eq!(result["rulesUpdated"], 1);

    let second = write_rule(temp_dir.path(), "second.json", rule_json("test#4-1", "b", 60));
    let created = run_ok(&temp_dir, &["create", "--file", second.to_str().unwrap()]);
    assert_eq!(created["intervalSeconds"], 120);

    let group = run_ok(&temp_dir, &["group", "--org", "1", "--group", "b"]);
    assert_eq!(group["intervalSeconds"], 120);
    assert_eq!(group["rules"].as_array().unwrap().len(), 2);
}

#[test]
fn test_cli_validation_error_exits_nonzero() {
    let temp_dir = TempDir::new().unwrap();
    let file = write_rule(temp_dir.path(), "bad.json", rule_json("bad", "a", 15));

    let output = run(&temp_dir, &["create", "--file", file.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_VALIDATION"));
}

#[test]
fn test_cli_missing_rule_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let output = run(&temp_dir, &["get", "--org", "1", "--uid", "missing"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_NOT_FOUND"));
}

#[test]
fn test_cli_reads_service_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("alertprov.toml");
    fs::write(
        &config_path,
        "[service]\nbase_interval_seconds = 30\ndefault_interval_seconds = 90\n",
    )
    .unwrap();
    let file = write_rule(temp_dir.path(), "rule.json", rule_json("cfg", "a", 0));

    let created = run_ok(
        &temp_dir,
        &[
            "create",
            "--file",
            file.to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
        ],
    );
    assert_eq!(created["intervalSeconds"], 90);

    let aligned_to_old_base = write_rule(temp_dir.path(), "r2.json", rule_json("r2", "z", 40));
    let output = run(
        &temp_dir,
        &[
            "create",
            "--file",
            aligned_to_old_base.to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());
}

#[test]
fn test_cli_request_id_reaches_logs() {
    let temp_dir = TempDir::new().unwrap();

    let output = run(
        &temp_dir,
        &["list", "--org", "1", "--log-json", "--request-id", "req-cli-77"],
    );
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("req-cli-77"),
        "log output should carry the request id: {}",
        stderr
    );
}
