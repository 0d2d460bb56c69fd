//! End-to-end tests for the CLI commands.
//!
//! Each test builds a small tree in one temp directory, keeps the store in a
//! second one (so the data directory is never part of the scanned tree), and
//! runs the binary with `--data-dir`.

// Allow deprecated cargo_bin usage until assert_cmd updates API
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

struct Project {
    tree: TempDir,
    data: TempDir,
}

impl Project {
    /// `root/{A/, B/inner.txt, a.txt, z.txt}`
    fn new() -> Self {
        let tree = tempfile::tempdir().expect("create tree");
        fs::create_dir(tree.path().join("A")).unwrap();
        fs::create_dir(tree.path().join("B")).unwrap();
        fs::write(tree.path().join("B/inner.txt"), "hello").unwrap();
        fs::write(tree.path().join("a.txt"), "0123456789").unwrap();
        fs::write(tree.path().join("z.txt"), "").unwrap();
        Self {
            tree,
            data: tempfile::tempdir().expect("create data dir"),
        }
    }

    fn root(&self) -> String {
        self.tree.path().to_string_lossy().into_owned()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("dirscan").unwrap();
        cmd.arg("--data-dir").arg(self.data.path());
        cmd
    }

    fn scan(&self) {
        self.cmd()
            .args(["scan", "--quiet"])
            .arg(self.root())
            .assert()
            .success();
    }

    fn json(&self, args: &[&str]) -> Value {
        let out = self.cmd().args(args).assert().success().get_output().stdout.clone();
        serde_json::from_slice(&out).expect("stdout is JSON")
    }
}

// ─── scan ───────────────────────────────────────────────────────────────────

#[test]
fn e2e_scan_reports_counts_and_progress() {
    let p = Project::new();
    let assert = p.cmd().arg("scan").arg(p.root()).assert().success();
    let output = assert.get_output();

    let stdout: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stdout["success"], true);
    assert_eq!(stdout["message"], "Folder scanned successfully");
    assert_eq!(stdout["data"]["folder_count"], 3);
    assert_eq!(stdout["data"]["file_count"], 3);

    let stderr = String::from_utf8_lossy(&output.stderr);
    let progress: Vec<Value> = stderr
        .lines()
        .filter(|l| l.starts_with('{'))
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(progress.len(), 6);
    assert_eq!(progress[0]["folderCount"], 1);
    assert_eq!(progress[0]["fileCount"], 0);
    assert!(p.data.path().join("index.db").exists());
}

#[test]
fn e2e_scan_quiet_prints_no_progress() {
    let p = Project::new();
    p.cmd()
        .args(["scan", "--quiet"])
        .arg(p.root())
        .assert()
        .success()
        .stderr(predicate::str::contains("folderCount").not());
}

#[test]
fn e2e_scan_missing_folder_fails() {
    let p = Project::new();
    p.cmd()
        .arg("scan")
        .arg(p.tree.path().join("nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""))
        .stderr(predicate::str::contains("cannot stat"));
}

#[test]
fn e2e_rescan_replaces_previous_tree() {
    let p = Project::new();
    p.scan();
    fs::remove_dir_all(p.tree.path().join("B")).unwrap();
    p.scan();

    let all = p.json(&["hierarchy"]);
    let paths: Vec<&str> = all["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths.len(), 4);
    assert!(paths.iter().all(|path| !path.contains("inner.txt")));
}

// ─── hierarchy / children / find ────────────────────────────────────────────

#[test]
fn e2e_hierarchy_is_level_ordered() {
    let p = Project::new();
    p.scan();

    let all = p.json(&["hierarchy"]);
    let names: Vec<&str> = all["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names[1..], ["A", "B", "a.txt", "z.txt", "inner.txt"]);
    assert_eq!(all["data"][0]["path"], p.root());
    assert!(all["data"][0]["parent_id"].is_null());
}

#[test]
fn e2e_hierarchy_tree_renders_text() {
    let p = Project::new();
    p.scan();
    p.cmd()
        .args(["hierarchy", "--tree"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  B/\n    inner.txt  (5 B)"))
        .stdout(predicate::str::contains("3 directories, 3 files, 15 B"));
}

#[test]
fn e2e_children_of_root_and_top() {
    let p = Project::new();
    p.scan();

    let roots = p.json(&["children"]);
    let roots = roots["data"].as_array().unwrap();
    assert_eq!(roots.len(), 1);
    let root_id = roots[0]["id"].as_i64().unwrap().to_string();

    let kids = p.json(&["children", "--parent", &root_id]);
    let kinds: Vec<&str> = kids["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, ["directory", "directory", "file", "file"]);
}

#[test]
fn e2e_find_by_path() {
    let p = Project::new();
    p.scan();

    let path = p.tree.path().join("a.txt").to_string_lossy().into_owned();
    let found = p.json(&["find", &path]);
    assert_eq!(found["data"]["name"], "a.txt");
    assert_eq!(found["data"]["size"], 10);

    p.cmd()
        .args(["find", "/definitely/not/stored"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no entry for path"));
}

// ─── stats / verify / clear ─────────────────────────────────────────────────

#[test]
fn e2e_stats_counts_entries() {
    let p = Project::new();
    p.scan();
    let stats = p.json(&["stats"]);
    assert_eq!(stats["directories"], 3);
    assert_eq!(stats["files"], 3);
    assert_eq!(stats["total_bytes"], 15);
    assert_eq!(stats["roots"], 1);
}

#[test]
fn e2e_verify_requires_index() {
    let p = Project::new();
    p.cmd()
        .arg("verify")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Index not found"));
}

#[test]
fn e2e_verify_clean_after_scan() {
    let p = Project::new();
    p.scan();
    let report = p.json(&["verify"]);
    assert_eq!(report["sqlite_ok"], true);
    assert_eq!(report["duplicate_paths"], 0);
    assert_eq!(report["orphan_entries"], 0);
    assert_eq!(report["file_parents"], 0);
}

#[test]
fn e2e_clear_empties_store_twice() {
    let p = Project::new();
    p.scan();
    assert_eq!(p.json(&["clear"])["removed"], 6);
    assert_eq!(p.json(&["clear"])["removed"], 0);
    assert!(p.json(&["hierarchy"])["data"].as_array().unwrap().is_empty());
}

// ─── state ──────────────────────────────────────────────────────────────────

#[test]
fn e2e_state_round_trip() {
    let p = Project::new();
    assert!(p.json(&["state"])["data"].is_null());

    p.scan();
    let state = p.json(&["state"]);
    assert_eq!(state["data"]["last_scanned_path"], p.root());
    assert_eq!(state["data"]["scan_completed"], true);

    let cleared = p.json(&["state", "--clear"]);
    assert_eq!(cleared["message"], "App state cleared successfully");
    assert!(p.json(&["state"])["data"].is_null());
}

// ─── config ─────────────────────────────────────────────────────────────────

#[test]
fn e2e_config_exclude_and_pretty_output() {
    let p = Project::new();
    fs::write(
        p.data.path().join("config.toml"),
        "[scan]\nexclude_patterns = [\"*.txt\"]\n\n[output]\nformat = \"pretty\"\n",
    )
    .unwrap();
    p.cmd()
        .args(["scan", "--quiet"])
        .arg(p.root())
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  \"success\": true"));

    let all = p.json(&["hierarchy"]);
    assert_eq!(all["data"].as_array().unwrap().len(), 3);
}
