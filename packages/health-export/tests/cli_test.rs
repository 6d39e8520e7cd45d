//! Tests for the `health-export` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn health_export() -> Command {
    let mut cmd = Command::cargo_bin("health-export").unwrap();
    for var in [
        "HEALTH_EXPORT_CONTAINER",
        "HEALTH_EXPORT_OUTPUT_DIR",
        "HEALTH_EXPORT_PROJECTION",
        "HEALTH_EXPORT_SOURCE_URL",
        "HEALTH_EXPORT_MAX_RETRIES",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_extract_writes_tables() {
    let out = tempfile::tempdir().unwrap();

    health_export()
        .arg("extract")
        .arg(fixture("export.xml"))
        .arg("-o")
        .arg(out.path())
        .args(["-c", "user-1", "--trailing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("StepCount.csv (2 rows)"))
        .stdout(predicate::str::contains("Tables: 6"));

    let heart = fs::read_to_string(out.path().join("user-1").join("HeartRate.csv")).unwrap();
    assert!(heart.starts_with("activity,unit,time,starttime,endtime,value\n"));
}

#[test]
fn test_extract_reads_container_from_env() {
    let out = tempfile::tempdir().unwrap();

    health_export()
        .env("HEALTH_EXPORT_CONTAINER", "from-env")
        .env("HEALTH_EXPORT_OUTPUT_DIR", out.path())
        .arg("extract")
        .arg(fixture("export.xml"))
        .assert()
        .success();

    assert!(out.path().join("from-env").join("Workout.csv").is_file());
}

#[test]
fn test_extract_missing_input_fails() {
    let out = tempfile::tempdir().unwrap();

    health_export()
        .args(["extract", "does-not-exist.xml", "-o"])
        .arg(out.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read does-not-exist.xml"));
}

#[test]
fn test_extract_malformed_input_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.xml");
    fs::write(&input, "<HealthData><Record type=\"x\">").unwrap();
    let out = dir.path().join("out");

    health_export()
        .arg("extract")
        .arg(&input)
        .arg("-o")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed input"));

    assert!(!out.exists());
}

#[test]
fn test_stats_prints_report() {
    health_export()
        .arg("stats")
        .arg(fixture("export.xml"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Tags:\n"))
        .stdout(predicate::str::contains("Record types:\nActiveEnergyBurned: 3"))
        .stderr(predicate::str::contains("Unexpected node of type ExportDate."));
}

#[test]
fn test_daily_json() {
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("ActiveEnergyBurned.csv");
    fs::write(
        &table,
        "endtime,value\n2024-03-01 08:15:00 +0100,10.5\n2024-03-01 21:00:00 +0100,4.5\n",
    )
    .unwrap();

    health_export()
        .arg("daily")
        .arg(&table)
        .args(["--format", "json"])
        .assert()
        .success()
        .stdout("[{\"date\":\"2024-03-01\",\"value\":15.0}]\n");
}

#[test]
fn test_daily_rejects_unknown_format() {
    health_export()
        .arg("daily")
        .arg(fixture("export.xml"))
        .args(["--format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format 'xml'"));
}
