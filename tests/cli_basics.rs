mod common;
use common::cardinal_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_help_command() {
    cardinal_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "SQL dialect detection and cardinality estimation over ODBC",
        ));
}

#[test]
fn test_version_command() {
    cardinal_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cardinal"));
}

#[test]
fn test_invalid_subcommand() {
    cardinal_cmd()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_missing_subcommand() {
    cardinal_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: cardinal"));
}

#[test]
fn test_dialects_lists_builtins() {
    cardinal_cmd()
        .arg("dialects")
        .assert()
        .success()
        .stdout(predicate::str::contains("mysql"))
        .stdout(predicate::str::contains("infobright"))
        .stdout(predicate::str::contains("postgres"))
        .stdout(predicate::str::contains("generic"));
}

#[test]
fn test_show_prints_capabilities() {
    cardinal_cmd()
        .args(["show", "mysql"])
        .assert()
        .success()
        .stdout(predicate::str::contains("product = \"mysql\""))
        .stdout(predicate::str::contains("quote = \"`\""))
        .stdout(predicate::str::contains("allows_derived_table_in_from = true"));
}

#[test]
fn test_show_applies_version_gates() {
    cardinal_cmd()
        .args(["show", "mysql", "--server-version", "3.23.58"])
        .assert()
        .success()
        .stdout(predicate::str::contains("allows_derived_table_in_from = false"));
}

#[test]
fn test_show_accepts_alias() {
    cardinal_cmd()
        .args(["show", "pg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("product = \"postgres\""));
}

#[test]
fn test_show_unknown_dialect_fails() {
    cardinal_cmd()
        .args(["show", "db2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("db2"));
}

#[test]
fn test_inline_generates_union_all() {
    cardinal_cmd()
        .args([
            "inline",
            "--dialect",
            "mysql",
            "--column",
            "name:string",
            "--column",
            "qty:integer",
            "--row",
            "Gold,3",
            "--row",
            "Silver,",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "select 'Gold' as `name`, 3 as `qty` union all select 'Silver' as `name`, null as `qty`",
        ));
}

#[test]
fn test_inline_rejects_bad_literal() {
    cardinal_cmd()
        .args(["inline", "--dialect", "mysql", "--column", "qty:integer", "--row", "many"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_stats_without_connection_fails() {
    let temp_dir = tempdir().unwrap();

    cardinal_cmd()
        .args(["stats", "table", "sales"])
        .current_dir(&temp_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No connection string provided"));
}

#[test]
fn test_detect_without_connection_fails() {
    let temp_dir = tempdir().unwrap();

    cardinal_cmd()
        .arg("detect")
        .current_dir(&temp_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No connection string provided"));
}
