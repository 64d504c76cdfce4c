//! Integration tests for the `sitekeep` binary.
//!
//! Every test points the worker at temp files so nothing touches the
//! user's real configuration or the network.
#![allow(clippy::unwrap_used)]

use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

use sitekeep_core::{MaintenanceLogEntry, TaskKind, Trigger};

// ── Helpers ─────────────────────────────────────────────────────────

fn sitekeep_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("sitekeep");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("SITEKEEP_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

/// A workspace with a config file whose store and backups live in `dir`.
fn workspace(sites: &Value) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let sites_path = dir.path().join("sites.json");
    std::fs::write(&sites_path, serde_json::to_vec(sites).unwrap()).unwrap();

    let config_path = dir.path().join("sitekeep.toml");
    let config = format!(
        "[store]\nsites_path = {sites:?}\njournal_path = {journal:?}\n\n\
         [storage]\nbackend = \"fs\"\ndirectory = {backups:?}\n",
        sites = sites_path.display().to_string(),
        journal = dir.path().join("journal.jsonl").display().to_string(),
        backups = dir.path().join("backups").display().to_string(),
    );
    std::fs::write(&config_path, config).unwrap();
    (dir, config_path)
}

fn write_journal(dir: &Path, entries: &[MaintenanceLogEntry]) {
    let mut file = std::fs::File::create(dir.join("journal.jsonl")).unwrap();
    for entry in entries {
        writeln!(file, "{}", serde_json::to_string(entry).unwrap()).unwrap();
    }
}

fn bakery() -> Value {
    json!([{
        "id": "bakery",
        "name": "Bakery",
        "tenant_id": "t1",
        "status": "deployed",
        "deploy_url": "http://127.0.0.1:9/",
        "plan": "pro",
        "billing_status": "canceled"
    }])
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    sitekeep_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("--once")
            .and(predicate::str::contains("analyze"))
            .and(predicate::str::contains("history")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    sitekeep_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sitekeep"));
}

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    sitekeep_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Worker ──────────────────────────────────────────────────────────

#[test]
fn test_missing_config_file_exits_1() {
    let home = tempfile::tempdir().unwrap();
    sitekeep_cmd(home.path())
        .args(["--once", "--config"])
        .arg(home.path().join("absent.toml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn test_invalid_config_exits_1() {
    let (dir, config) = workspace(&json!([]));
    std::fs::write(&config, "[schedule]\nbackup_interval = \"whenever\"\n").unwrap();
    sitekeep_cmd(dir.path())
        .args(["--once", "--config"])
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("schedule.backup_interval"));
}

#[test]
fn test_bad_cron_fails_before_the_startup_pass() {
    let (dir, config) = workspace(&json!([{
        "id": "bakery",
        "name": "Bakery",
        "tenant_id": "t1",
        "status": "deployed",
        "deploy_url": "http://127.0.0.1:9/",
        "plan": "basic",
        "billing_status": "active"
    }]));
    let mut body = std::fs::read_to_string(&config).unwrap();
    body.push_str("\n[schedule]\nseo_cron = \"a b c d e f\"\n");
    std::fs::write(&config, body).unwrap();

    sitekeep_cmd(dir.path())
        .args(["--once", "--config"])
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid seo cron expression"));
    assert!(!dir.path().join("journal.jsonl").exists());
}

#[test]
fn test_once_with_no_sites() {
    let (dir, config) = workspace(&json!([]));
    let output = sitekeep_cmd(dir.path())
        .args(["--once", "--output", "json", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["sites"], json!(0));
    assert_eq!(summary["entries_written"], json!(0));
}

#[test]
fn test_once_skips_canceled_sites() {
    let (dir, config) = workspace(&bakery());
    let output = sitekeep_cmd(dir.path())
        .args(["--once", "-o", "json", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["sites"], json!(1));
    assert_eq!(summary["skipped"], json!(1));
    assert!(!dir.path().join("journal.jsonl").exists());
}

// ── History ─────────────────────────────────────────────────────────

#[test]
fn test_history_lists_newest_first() {
    let (dir, config) = workspace(&bakery());
    let now = chrono::Utc::now();
    write_journal(
        dir.path(),
        &[
            MaintenanceLogEntry::failure("bakery".into(), TaskKind::Backup, Trigger::Cron, "older")
                .with_created_at(now - chrono::TimeDelta::hours(2)),
            MaintenanceLogEntry::failure("bakery".into(), TaskKind::Seo, Trigger::Startup, "newer")
                .with_created_at(now - chrono::TimeDelta::hours(1)),
        ],
    );

    let output = sitekeep_cmd(dir.path())
        .args(["history", "bakery", "-o", "json", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let entries: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["kind"], json!("seo"));
    assert_eq!(entries[1]["result"]["message"], json!("older"));
}

#[test]
fn test_history_limit_is_clamped() {
    let (dir, config) = workspace(&bakery());
    let entries: Vec<_> = (0..3)
        .map(|_| {
            MaintenanceLogEntry::failure("bakery".into(), TaskKind::Uptime, Trigger::Cron, "down")
        })
        .collect();
    write_journal(dir.path(), &entries);

    let output = sitekeep_cmd(dir.path())
        .args(["history", "bakery", "--limit", "0", "-o", "json", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    let listed: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed.len(), 1);
}

#[test]
fn test_history_table_output() {
    let (dir, config) = workspace(&bakery());
    write_journal(
        dir.path(),
        &[MaintenanceLogEntry::failure(
            "bakery".into(),
            TaskKind::Backup,
            Trigger::Manual,
            "storage offline",
        )],
    );
    sitekeep_cmd(dir.path())
        .args(["history", "bakery", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("backup")
                .and(predicate::str::contains("fail"))
                .and(predicate::str::contains("storage offline")),
        );
}

#[test]
fn test_history_unknown_site_exits_4() {
    let (dir, config) = workspace(&bakery());
    sitekeep_cmd(dir.path())
        .args(["history", "nope", "--config"])
        .arg(&config)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Site 'nope' not found"));
}

// ── On-demand tasks ─────────────────────────────────────────────────

fn journal_lines(dir: &Path) -> Vec<Value> {
    std::fs::read_to_string(dir.join("journal.jsonl"))
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_ping_records_one_manual_entry() {
    let (dir, config) = workspace(&bakery());
    let output = sitekeep_cmd(dir.path())
        .args(["ping", "bakery", "-o", "json", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let entry: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entry["kind"], json!("uptime"));
    assert_eq!(entry["outcome"], json!("fail"));

    let journal = journal_lines(dir.path());
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0]["trigger"], json!("manual"));
    assert!(journal[0]["result"]["status_code"].is_null());
}

#[test]
fn test_backup_failure_is_recorded() {
    let (dir, config) = workspace(&bakery());
    sitekeep_cmd(dir.path())
        .args(["backup", "bakery", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("backup").and(predicate::str::contains("fail")));

    let journal = journal_lines(dir.path());
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0]["kind"], json!("backup"));
}

#[test]
fn test_ping_unknown_site_exits_4() {
    let (dir, config) = workspace(&bakery());
    sitekeep_cmd(dir.path())
        .args(["ping", "nope", "--config"])
        .arg(&config)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Site 'nope' not found"));
    assert!(!dir.path().join("journal.jsonl").exists());
}

#[test]
fn test_backup_undeployed_site_exits_1() {
    let (dir, config) = workspace(&json!([{
        "id": "draft",
        "name": "Draft",
        "tenant_id": "t1",
        "status": "analyzed"
    }]));
    sitekeep_cmd(dir.path())
        .args(["backup", "draft", "--config"])
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no live deployment"));
    assert!(!dir.path().join("journal.jsonl").exists());
}

// ── Analyze ─────────────────────────────────────────────────────────

#[test]
fn test_analyze_bundle_json() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("site.zip");
    let mut writer = zip::ZipWriter::new(std::fs::File::create(&bundle).unwrap());
    let options = zip::write::SimpleFileOptions::default();
    writer.start_file("index.html", options).unwrap();
    writer
        .write_all(
            b"<title>Bakery</title><meta name=\"description\" content=\"Bread\">\
              <link rel=\"icon\" href=\"img/icon.png\">",
        )
        .unwrap();
    writer.start_file("img/icon.png", options).unwrap();
    writer.write_all(&[0x89, b'P', b'N', b'G']).unwrap();
    writer.finish().unwrap();

    let output = sitekeep_cmd(dir.path())
        .args(["analyze", "-o", "json"])
        .arg(&bundle)
        .output()
        .unwrap();
    assert!(output.status.success());

    let analysis: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(analysis["title"], json!("Bakery"));
    assert_eq!(analysis["seo_score"], json!(100));
    assert_eq!(analysis["favicon"]["path"], json!("img/icon.png"));
}

#[test]
fn test_analyze_missing_bundle_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    sitekeep_cmd(dir.path())
        .args(["analyze"])
        .arg(dir.path().join("nope.zip"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot read bundle"));
}
