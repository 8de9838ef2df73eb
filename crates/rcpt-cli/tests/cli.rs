//! Command-line behaviour of the `rcpt` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const RECEIPT: &str = "Schweinenackenbraten 10,85 A
Preisvorteil -0,30
Fairtrade Rosen 2,99 x 4 11,96 A
zu zahlen 22,51
";

fn rcpt(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rcpt").unwrap();
    cmd.env("XDG_CONFIG_HOME", home).env("HOME", home);
    cmd
}

fn write_receipt(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_parse_json_output() {
    let dir = TempDir::new().unwrap();
    let input = write_receipt(&dir, "receipt.txt", RECEIPT);

    rcpt(dir.path())
        .arg("parse")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"Schweinenackenbraten\""))
        .stdout(predicate::str::contains("\"receipt_total\": \"22.51\""));
}

#[test]
fn test_parse_csv_output() {
    let dir = TempDir::new().unwrap();
    let input = write_receipt(&dir, "receipt.txt", RECEIPT);

    rcpt(dir.path())
        .args(["parse", "-f", "csv"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "name,quantity,unit_price,total,discount,tax_code,method,lines",
        ))
        .stdout(predicate::str::contains("Fairtrade Rosen,4,2.99,11.96,0.00,A,one-liner,2"));
}

#[test]
fn test_parse_text_output_with_metadata() {
    let dir = TempDir::new().unwrap();
    let input = write_receipt(
        &dir,
        "receipt.txt",
        "LIDL Berlin\nMilch 1,19 A\nSumme 1,19\nDatum 24.12.2025 18:05\n",
    );

    rcpt(dir.path())
        .args(["parse", "-f", "text"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Store:     LIDL"))
        .stdout(predicate::str::contains("Date:      24.12.2025"))
        .stdout(predicate::str::contains("Locale:    de"));
}

#[test]
fn test_parse_missing_file_fails() {
    let dir = TempDir::new().unwrap();

    rcpt(dir.path())
        .args(["parse", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_mark_command() {
    let dir = TempDir::new().unwrap();
    let input = write_receipt(&dir, "receipt.txt", RECEIPT);

    rcpt(dir.path())
        .arg("mark")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[QTY_LINE] Fairtrade Rosen | qty=4 | price=2.99 | TOTAL=11.96 | A",
        ))
        .stdout(predicate::str::contains("Preisvorteil -0,30"));
}

#[test]
fn test_discounts_json() {
    let dir = TempDir::new().unwrap();
    let input = write_receipt(&dir, "receipt.txt", RECEIPT);

    rcpt(dir.path())
        .args(["discounts", "--json"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"discount_count\": 1"))
        .stdout(predicate::str::contains("\"kind\": \"ITEM_DISCOUNT\""));
}

#[test]
fn test_config_init_and_show() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");

    rcpt(dir.path())
        .args(["--locale", "en", "config", "init", "-o"])
        .arg(&config)
        .assert()
        .success();
    assert!(config.exists());

    rcpt(dir.path())
        .args(["config", "show", "-c"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"decimal_separator\": \".\""));

    rcpt(dir.path())
        .args(["config", "init", "-o"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_batch_with_summary() {
    let dir = TempDir::new().unwrap();
    write_receipt(&dir, "a.txt", RECEIPT);
    write_receipt(&dir, "b.txt", "Milch 1,19 A\nSumme 1,19\n");
    let out = dir.path().join("out");

    rcpt(dir.path())
        .arg("batch")
        .arg(format!("{}/*.txt", dir.path().display()))
        .arg("-o")
        .arg(&out)
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 successful"));

    assert!(out.join("a.json").exists());
    assert!(out.join("b.json").exists());
    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status,locale,date,store,items"));
    assert!(summary.contains("b.txt,success,de,,,1,0,0,1.19,1.19,0,"));
}
