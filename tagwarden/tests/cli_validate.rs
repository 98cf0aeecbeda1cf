// tagwarden/tests/cli_validate.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn write_rules(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("tag_rules.yaml");
    fs::write(
        &path,
        r#"
tag_configuration:
  tag_name: GDPR_CLASSIFICATION
categories:
  - name: EMAIL
name_patterns:
  - pattern: "e?mail"
    category: EMAIL
data_patterns:
  - pattern: '[a-z0-9._%+-]+@[a-z0-9.-]+'
    category: EMAIL
thresholds:
  data_pattern_match: 0.1
"#,
    )
    .unwrap();
    path
}

fn write_policies(dir: &std::path::Path, valid: bool) -> std::path::PathBuf {
    let path = dir.join("policy_config.yaml");
    let data_types = if valid {
        "        data_types:\n          VARCHAR: \"'***'\"\n"
    } else {
        ""
    };
    fs::write(
        &path,
        format!(
            r#"
policies:
  global:
    database: ANALYTICS
  category_policies:
    - category: EMAIL
      masking_policy:
        name: mask_email
{}"#,
            data_types
        ),
    )
    .unwrap();
    path
}

#[test]
fn test_validate_accepts_good_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write_rules(dir.path());
    let policies = write_policies(dir.path(), true);

    let mut cmd = Command::cargo_bin("tagwarden").unwrap();
    cmd.arg("validate")
        .arg("--rules")
        .arg(&rules)
        .arg("--policy-config")
        .arg(&policies)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rules valid"))
        .stdout(predicate::str::contains("Policy spec valid"));
}

#[test]
fn test_validate_rejects_policy_without_data_types() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write_rules(dir.path());
    let policies = write_policies(dir.path(), false);

    let mut cmd = Command::cargo_bin("tagwarden").unwrap();
    cmd.arg("validate")
        .arg("--rules")
        .arg(&rules)
        .arg("--policy-config")
        .arg(&policies)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation failed"));
}

#[test]
fn test_validate_rejects_missing_rules_file() {
    let dir = tempfile::tempdir().unwrap();
    let policies = write_policies(dir.path(), true);

    let mut cmd = Command::cargo_bin("tagwarden").unwrap();
    cmd.arg("validate")
        .arg("--rules")
        .arg(dir.path().join("nope.yaml"))
        .arg("--policy-config")
        .arg(&policies)
        .assert()
        .failure();
}

#[test]
fn test_scan_empty_warehouse_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write_rules(dir.path());
    let db_path = dir.path().join("warehouse.duckdb");
    let output = dir.path().join("results.json");

    let mut cmd = Command::cargo_bin("tagwarden").unwrap();
    cmd.arg("scan")
        .arg("--db-path")
        .arg(&db_path)
        .arg("--rules")
        .arg(&rules)
        .arg("--output")
        .arg(&output)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("SUCCESS"));

    let exported = fs::read_to_string(&output).unwrap();
    assert_eq!(exported.trim(), "[]");
}
