//! Integration tests for the trt binary.
//!
//! These tests verify end-to-end behavior including:
//! - Entry and regimen logging workflows
//! - Projection and statistics output
//! - Cascade deletion
//! - CSV export

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get a CLI command pointed at the given data directory
fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("trt"));
    cmd.arg("--data-dir").arg(data_dir);
    cmd
}

/// Extract the "id: <uuid>" line a mutating command prints
fn extract_id(stdout: &[u8]) -> String {
    let text = String::from_utf8_lossy(stdout);
    text.lines()
        .find_map(|line| line.trim().strip_prefix("id: "))
        .expect("no id line in output")
        .to_string()
}

fn add_regimen(data_dir: &Path, name: &str, interval: &str) -> String {
    let output = cli(data_dir)
        .arg("regimen")
        .arg("add")
        .arg("--name")
        .arg(name)
        .arg("--mg")
        .arg("100")
        .arg("--interval")
        .arg(interval)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    extract_id(&output)
}

fn log_dose(data_dir: &Path, mg: &str, regimen: Option<&str>) -> String {
    let mut cmd = cli(data_dir);
    cmd.arg("dose").arg("--mg").arg(mg);
    if let Some(regimen) = regimen {
        cmd.arg("--regimen").arg(regimen);
    }
    let output = cmd
        .assert()
        .success()
        .stdout(predicate::str::contains("Dose logged"))
        .get_output()
        .stdout
        .clone();
    extract_id(&output)
}

fn log_lab(data_dir: &Path, level: &str, date: Option<&str>) {
    let mut cmd = cli(data_dir);
    cmd.arg("lab").arg("--level").arg(level);
    if let Some(date) = date {
        cmd.arg("--date").arg(date);
    }
    cmd.assert().success();
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("trt"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Personal therapy tracking dashboard"));
}

#[test]
fn test_dose_creates_state_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_dose(data_dir, "100", None);

    let state_path = data_dir.join("state.json");
    assert!(state_path.exists());
    let raw = fs::read_to_string(&state_path).unwrap();
    assert!(raw.contains("\"eventType\":\"dose\""));
}

#[test]
fn test_entries_list_newest_first() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_lab(data_dir, "450", Some("2024-01-10"));
    log_lab(data_dir, "500", Some("2024-01-20"));

    let output = cli(data_dir)
        .arg("entries")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8_lossy(&output);
    let jan20 = stdout.find("2024-01-20").expect("missing newer lab");
    let jan10 = stdout.find("2024-01-10").expect("missing older lab");
    assert!(jan20 < jan10, "entries should list newest first");
}

#[test]
fn test_entries_kind_filter() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_dose(data_dir, "100", None);
    cli(data_dir)
        .arg("wellbeing")
        .arg("--score")
        .arg("7")
        .assert()
        .success();

    cli(data_dir)
        .arg("entries")
        .arg("--kind")
        .arg("dose")
        .assert()
        .success()
        .stdout(predicate::str::contains("mg").and(predicate::str::contains("/10").not()));
}

#[test]
fn test_unknown_kind_falls_back_to_all() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_dose(data_dir, "100", None);

    cli(data_dir)
        .arg("entries")
        .arg("--kind")
        .arg("banana")
        .assert()
        .success()
        .stderr(predicate::str::contains("Unknown kind"));
}

#[test]
fn test_rm_entry_removes_it() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let id = log_dose(data_dir, "100", None);

    cli(data_dir).arg("rm").arg(&id).assert().success();

    cli(data_dir)
        .arg("entries")
        .assert()
        .success()
        .stdout(predicate::str::contains("No entries recorded"));
}

#[test]
fn test_rm_missing_entry_is_noop() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir).arg("rm").arg("no-such-id").assert().success();
}

#[test]
fn test_regimen_add_and_list() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    add_regimen(data_dir, "Enanthate weekly", "7");

    cli(data_dir)
        .arg("regimen")
        .arg("list")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Enanthate weekly")
                .and(predicate::str::contains("every 7 days")),
        );
}

#[test]
fn test_regimen_add_rejects_zero_interval() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .arg("regimen")
        .arg("add")
        .arg("--name")
        .arg("broken")
        .arg("--mg")
        .arg("100")
        .arg("--interval")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("interval must be at least 1 day"));
}

#[test]
fn test_regimen_update_changes_fields() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let id = add_regimen(data_dir, "Enanthate weekly", "7");

    cli(data_dir)
        .arg("regimen")
        .arg("update")
        .arg(&id)
        .arg("--interval")
        .arg("10")
        .assert()
        .success();

    cli(data_dir)
        .arg("regimen")
        .arg("list")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("every 10 days")
                // Untouched fields survive the partial update
                .and(predicate::str::contains("Enanthate weekly")),
        );
}

#[test]
fn test_regimen_rm_cascades_to_dose_entries() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let regimen_id = add_regimen(data_dir, "Enanthate weekly", "7");
    log_dose(data_dir, "100", Some(&regimen_id));
    log_lab(data_dir, "500", None);

    cli(data_dir)
        .arg("regimen")
        .arg("rm")
        .arg(&regimen_id)
        .assert()
        .success();

    // The dose went with the regimen; the lab stays
    let state: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(data_dir.join("state.json")).unwrap()).unwrap();
    let entries = state["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["eventType"], "lab");
    assert!(state["regimens"].as_array().unwrap().is_empty());
}

#[test]
fn test_upcoming_projects_per_regimen() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    add_regimen(data_dir, "Enanthate weekly", "7");

    let output = cli(data_dir)
        .arg("upcoming")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8_lossy(&output);
    assert_eq!(stdout.matches("Enanthate weekly").count(), 3);
}

#[test]
fn test_upcoming_flags_overdue_regimen() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    // Started long ago with no doses logged: first projections are overdue
    cli(data_dir)
        .arg("regimen")
        .arg("add")
        .arg("--name")
        .arg("old regimen")
        .arg("--mg")
        .arg("100")
        .arg("--interval")
        .arg("7")
        .arg("--start")
        .arg("2020-01-01")
        .assert()
        .success();

    cli(data_dir)
        .arg("upcoming")
        .assert()
        .success()
        .stdout(predicate::str::contains("OVERDUE"));
}

#[test]
fn test_stats_on_empty_state() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    // No regimens: adherence defaults to perfect
    cli(data_dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Adherence:      100%")
                .and(predicate::str::contains("no labs in window")),
        );
}

#[test]
fn test_stats_reports_lab_average() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    // Two recent labs: 450 and 500
    log_lab(data_dir, "450", None);
    log_lab(data_dir, "500", None);

    cli(data_dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("475.0 ng/dL (2 labs)"));
}

#[test]
fn test_export_creates_csv() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let csv_path = data_dir.join("out/entries.csv");

    log_dose(data_dir, "100", None);

    cli(data_dir)
        .arg("export")
        .arg("--output")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 entries"));

    let contents = fs::read_to_string(&csv_path).unwrap();
    assert!(contents.contains("id,event_type,date"));
}

#[test]
fn test_reset_requires_confirmation() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_dose(data_dir, "100", None);

    cli(data_dir)
        .arg("reset")
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to reset"));

    cli(data_dir).arg("reset").arg("--yes").assert().success();

    cli(data_dir)
        .arg("entries")
        .assert()
        .success()
        .stdout(predicate::str::contains("No entries recorded"));
}

#[test]
fn test_wellbeing_score_range_enforced() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .arg("wellbeing")
        .arg("--score")
        .arg("11")
        .assert()
        .failure();
}

#[test]
fn test_state_persists_across_runs() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    log_dose(data_dir, "100", None);
    log_lab(data_dir, "500", None);

    let state: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(data_dir.join("state.json")).unwrap()).unwrap();
    assert_eq!(state["entries"].as_array().unwrap().len(), 2);
}
