//! End-to-end tests for the chronicle binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn chronicle(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("chronicle").unwrap();
    cmd.env("CHRONICLE_DATA_DIR", dir.path())
        .env_remove("CHRONICLE_ACTOR")
        .env_remove("CHRONICLE_LOG");
    cmd
}

#[test]
fn test_init_creates_files() {
    let dir = TempDir::new().unwrap();

    chronicle(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized chronicle"));

    assert!(dir.path().join("config.json").exists());
    assert!(dir.path().join("data").join("records.json").exists());
}

#[test]
fn test_order_update_is_audited() {
    let dir = TempDir::new().unwrap();

    chronicle(&dir)
        .args(["order", "create", "--customer", "ACME", "--total", "1999"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created order 1 for 'ACME'"));

    chronicle(&dir)
        .args(["--actor", "7", "--source", "OTP", "order", "set", "1", "status=SHIPPED"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated order 1"));

    chronicle(&dir)
        .args(["audit", "list", "--by", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("UPDATE MODIFIED Order#1 by 7 via OTP"))
        .stdout(predicate::str::contains(r#"status: "PENDING" -> "SHIPPED""#))
        .stdout(predicate::str::contains("1 entry"));

    chronicle(&dir)
        .args(["order", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SHIPPED"))
        .stdout(predicate::str::contains("19.99"));
}

#[test]
fn test_unchanged_update_reports_no_change() {
    let dir = TempDir::new().unwrap();

    chronicle(&dir)
        .args(["order", "create", "--customer", "ACME"])
        .assert()
        .success();

    chronicle(&dir)
        .args(["order", "set", "1", "status=PENDING"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Order 1 unchanged"));
}

#[test]
fn test_order_line_audit_relates_to_order() {
    let dir = TempDir::new().unwrap();

    chronicle(&dir)
        .args(["order", "create", "--customer", "ACME"])
        .assert()
        .success();

    chronicle(&dir)
        .args(["order", "add-line", "1", "--sku", "SKU-9", "--quantity", "2", "--price", "150"])
        .assert()
        .success();

    chronicle(&dir)
        .args(["audit", "list", "--entity", "1", "--entity-type", "OrderLine"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE CREATED OrderLine#1"))
        .stdout(predicate::str::contains(r#"sku: (empty) -> "SKU-9""#));
}

#[test]
fn test_invalid_field_is_rejected() {
    let dir = TempDir::new().unwrap();

    chronicle(&dir)
        .args(["order", "create", "--customer", "ACME"])
        .assert()
        .success();

    chronicle(&dir)
        .args(["order", "set", "1", "bogus=1"])
        .assert()
        .failure();

    chronicle(&dir)
        .args(["order", "set", "1", "created_by=5"])
        .assert()
        .failure();

    chronicle(&dir)
        .args(["order", "show", "99"])
        .assert()
        .failure();
}

#[test]
fn test_rate_versions_by_effective_date() {
    let dir = TempDir::new().unwrap();

    chronicle(&dir)
        .args(["rate", "set", "VAT", "--bps", "2000", "--effective", "2024-01-01"])
        .assert()
        .success();

    chronicle(&dir)
        .args(["rate", "set", "VAT", "--bps", "2100", "--effective", "2025-01-01"])
        .assert()
        .success();

    chronicle(&dir)
        .args(["rate", "history", "VAT"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 version(s)"));

    chronicle(&dir)
        .args(["rate", "at", "VAT", "2024-06-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("20.00%"));

    chronicle(&dir)
        .args(["rate", "at", "VAT", "2025-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("21.00%"));

    chronicle(&dir)
        .args(["rate", "at", "VAT", "2023-06-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No version of VAT in force"));

    chronicle(&dir)
        .args(["rate", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("21.00%"))
        .stdout(predicate::str::contains("20.00%").not());
}

#[test]
fn test_rate_retire_adds_version() {
    let dir = TempDir::new().unwrap();

    chronicle(&dir)
        .args(["rate", "set", "RED", "--bps", "550", "--effective", "2024-01-01"])
        .assert()
        .success();

    chronicle(&dir)
        .args(["rate", "retire", "RED", "--effective", "2024-07-01"])
        .assert()
        .success();

    chronicle(&dir)
        .args(["rate", "at", "RED", "2024-03-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ACTIVE"));

    chronicle(&dir)
        .args(["rate", "at", "RED", "2024-08-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RETIRED"));

    chronicle(&dir)
        .args(["audit", "list", "--entity-type", "taxrate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TaxRate#RED"))
        .stdout(predicate::str::contains("2 entries"));
}

#[test]
fn test_unchanged_rate_writes_no_version() {
    let dir = TempDir::new().unwrap();

    chronicle(&dir)
        .args(["rate", "set", "VAT", "--bps", "2000", "--effective", "2024-01-01"])
        .assert()
        .success();

    chronicle(&dir)
        .args(["rate", "set", "VAT", "--bps", "2000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rate VAT unchanged"));

    chronicle(&dir)
        .args(["rate", "history", "VAT"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 version(s)"));

    chronicle(&dir)
        .args(["audit", "list", "--entity-type", "TaxRate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 entry"))
        .stdout(predicate::str::contains("UPDATE").not());
}
