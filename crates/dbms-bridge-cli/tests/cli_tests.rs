//! CLI integration tests for dbms-bridge.
//!
//! These tests verify command-line argument parsing, help output,
//! subcommand results and exit codes for various error conditions.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a command for the dbms-bridge binary.
fn cmd() -> Command {
    Command::cargo_bin("dbms-bridge").unwrap()
}

fn script_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("dialects"))
        .stdout(predicate::str::contains("split"))
        .stdout(predicate::str::contains("translate"))
        .stdout(predicate::str::contains("lock-query"))
        .stdout(predicate::str::contains("select"));
}

#[test]
fn test_lock_query_help() {
    cmd()
        .args(["lock-query", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dialect"))
        .stdout(predicate::str::contains("--batch-size"))
        .stdout(predicate::str::contains("--wait"))
        .stdout(predicate::str::contains("--server-version"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dbms-bridge"));
}

// =============================================================================
// Subcommand Tests
// =============================================================================

#[test]
fn test_dialects_lists_keys() {
    cmd()
        .arg("dialects")
        .assert()
        .success()
        .stdout(predicate::str::contains("MS_SQL"))
        .stdout(predicate::str::contains("Microsoft SQL Server"))
        .stdout(predicate::str::contains("PostgreSQL"))
        .stdout(predicate::str::contains("none").not());
}

#[test]
fn test_split_json() {
    let file = script_file("SELECT ';' FROM t; SELECT 2;");
    cmd()
        .args(["--output-json", "split"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""SELECT ';' FROM t;""#))
        .stdout(predicate::str::contains(r#""SELECT 2;""#));
}

#[test]
fn test_translate_oracle_to_h2() {
    let file = script_file(
        "SET DEFINE OFF;\nCREATE SEQUENCE s MAXVALUE 9999999999999999999 NOORDER;\nEXIT;\n",
    );
    cmd()
        .args(["translate", "--from", "oracle", "--to", "h2"])
        .arg(file.path())
        .assert()
        .success()
        .stdout("CREATE SEQUENCE s MAXVALUE 999999999999999999;\n");
}

#[test]
fn test_translate_oracle_to_mssql() {
    let file = script_file("SELECT NEXTSEQ.NEXTVAL FROM DUAL");
    cmd()
        .args(["translate", "--from", "Oracle", "--to", "MS_SQL"])
        .arg(file.path())
        .assert()
        .success()
        .stdout("SELECT NEXT VALUE FOR NEXTSEQ\n");
}

#[test]
fn test_translate_json_lists_kept_statements() {
    let file = script_file("SET DEFINE OFF;\nDROP SEQUENCE s;\nEXIT;\n");
    cmd()
        .args(["--output-json", "translate", "--from", "oracle", "--to", "h2"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""target": "H2""#))
        .stdout(predicate::str::contains(r#""DROP SEQUENCE IF EXISTS s;""#))
        .stdout(predicate::str::contains("EXIT").not());
}

#[test]
fn test_lock_query_mssql() {
    cmd()
        .args([
            "lock-query",
            "--dialect",
            "mssql",
            "--batch-size",
            "10",
            "--wait",
            "-1",
            "SELECT * FROM t WHERE x=1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("SELECT TOP 10"))
        .stdout(predicate::str::contains("WITH (rowlock,updlock,readpast) WHERE"));
}

#[test]
fn test_select_mariadb_through_mysql() {
    cmd()
        .args([
            "--output-json",
            "select",
            "--product",
            "MySQL",
            "--version",
            "5.5.5-10.11.6-MariaDB",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""dialect": "MariaDB""#))
        .stdout(predicate::str::contains(r#""skip_locked": true"#));
}

#[test]
fn test_select_override_from_config() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "selector:\n  overrides:\n    EnterpriseDB: postgres").unwrap();
    cmd()
        .arg("--config")
        .arg(config.path())
        .args(["select", "--product", "EnterpriseDB"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dialect: PostgreSQL"));
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_invalid_query_exit_code() {
    cmd()
        .args(["lock-query", "--dialect", "oracle", "DELETE FROM t"])
        .assert()
        .code(2);
}

#[test]
fn test_unsupported_wait_exit_code() {
    cmd()
        .args([
            "lock-query",
            "--dialect",
            "postgres",
            "--wait",
            "5",
            "SELECT * FROM t",
        ])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("PostgreSQL"));
}

#[test]
fn test_disabled_translation_exit_code() {
    let file = script_file("SELECT 1;");
    cmd()
        .args(["translate", "--from", "generic", "--to", "oracle"])
        .arg(file.path())
        .assert()
        .code(4);
}

#[test]
fn test_invalid_config_exit_code() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "locking:\n  batch_size: 0").unwrap();
    cmd()
        .arg("--config")
        .arg(config.path())
        .arg("dialects")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("batch_size"));
}

#[test]
fn test_missing_script_exit_code() {
    cmd()
        .args(["split", "/nonexistent/script.sql"])
        .assert()
        .code(7);
}

#[test]
fn test_unknown_dialect_rejected_by_parser() {
    cmd()
        .args(["translate", "--from", "informix", "--to", "h2", "x.sql"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown dialect"));
}
