use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn fixtures_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("v1")).expect("mkdir v1");
    fs::write(dir.path().join("v1").join("a.txt"), "one\n").expect("write v1");
    fs::create_dir_all(dir.path().join("v2")).expect("mkdir v2");
    fs::write(dir.path().join("v2").join("b.txt"), "two\n").expect("write v2");
    dir
}

fn run_git(repo: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(repo)
        .args(args)
        .output()
        .expect("run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("utf8")
}

fn fixtures_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("git-fixtures"))
}

fn built_repo(fixtures: &Path) -> PathBuf {
    let output = fixtures_cmd()
        .args(["--porcelain", "build"])
        .arg(fixtures)
        .output()
        .expect("run build");
    assert!(
        output.status.success(),
        "build failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    PathBuf::from(json["path"].as_str().expect("path string"))
}

#[test]
fn build_prints_repository_on_secondary_branch() {
    let fixtures = fixtures_dir();
    let repo = built_repo(fixtures.path());

    assert_eq!(run_git(&repo, &["branch", "--show-current"]).trim(), "foo");
    assert_eq!(run_git(&repo, &["tag", "--list"]), "v1\nv2\n");
    assert!(repo.join("b.txt").exists());
    assert!(!repo.join("a.txt").exists());

    fs::remove_dir_all(&repo).expect("cleanup");
}

#[test]
fn init_uses_requested_branch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("repo");

    fixtures_cmd()
        .args(["init", "--branch", "trunk", "--dir"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains(target.to_string_lossy().to_string()));

    assert_eq!(run_git(&target, &["branch", "--show-current"]).trim(), "trunk");
    assert!(run_git(&target, &["log", "-1"]).contains("Author: Your Name <you@example.com>"));
}

#[test]
fn run_answers_prompt_and_reports_status_as_json() {
    let fixtures = fixtures_dir();
    let repo = built_repo(fixtures.path());

    let output = fixtures_cmd()
        .args(["--porcelain", "run", "--commit-message", "v2", "--cwd"])
        .arg(&repo)
        .args([
            "sh",
            "-c",
            "echo 'Deleted merge conflict for x'; read c; echo \"$c\" > c.txt; echo 'warning: kept' >&2",
        ])
        .output()
        .expect("run subject");
    assert!(
        output.status.success(),
        "run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["stderr"], "warning: kept\n");
    assert_eq!(json["status"], "?? c.txt\n");
    assert_eq!(fs::read_to_string(repo.join("c.txt")).expect("read"), "d\n");

    fs::remove_dir_all(&repo).expect("cleanup");
}

#[test]
fn run_fails_on_fatal_stderr() {
    let dir = tempfile::tempdir().expect("tempdir");

    fixtures_cmd()
        .args(["run", "--no-git", "--cwd"])
        .arg(dir.path())
        .args(["sh", "-c", "echo 'fatal: bad revision' >&2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fatal marker"));
}

#[test]
fn run_times_out_hung_subject() {
    let dir = tempfile::tempdir().expect("tempdir");

    fixtures_cmd()
        .args(["run", "--no-git", "--timeout", "1", "--cwd"])
        .arg(dir.path())
        .args(["sleep", "30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timed out"));
}

#[test]
fn compare_passes_for_matching_trees() {
    let actual = tempfile::tempdir().expect("actual");
    let expected = tempfile::tempdir().expect("expected");
    fs::write(actual.path().join("a.txt"), ">>>>>>> 1234abc (theirs)\n").expect("write");
    fs::create_dir_all(actual.path().join("node_modules")).expect("mkdir");
    fs::write(expected.path().join("a.txt"), ">>>>>>> 9999fff... theirs\n").expect("write");

    fixtures_cmd()
        .arg("compare")
        .arg(actual.path())
        .arg(expected.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("trees match"));
}

#[test]
fn compare_reports_differences_and_fails() {
    let actual = tempfile::tempdir().expect("actual");
    let expected = tempfile::tempdir().expect("expected");
    fs::write(actual.path().join("a.txt"), "new").expect("write");
    fs::write(expected.path().join("a.txt"), "old").expect("write");
    fs::write(expected.path().join("b.txt"), "").expect("write");

    let output = fixtures_cmd()
        .args(["--porcelain", "compare"])
        .arg(actual.path())
        .arg(expected.path())
        .output()
        .expect("run compare");
    assert!(!output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["equal"], false);
    let diffs = json["differences"].as_array().expect("differences array");
    assert!(diffs
        .iter()
        .any(|d| d["kind"] == "content_mismatch" && d["path"] == "a.txt"));
    assert!(diffs
        .iter()
        .any(|d| d["kind"] == "missing" && d["path"] == "b.txt"));
}

#[test]
fn read_prints_tree_as_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("sub/empty")).expect("mkdir");
    fs::write(dir.path().join("sub/x.txt"), "x").expect("write");

    let output = fixtures_cmd()
        .arg("read")
        .arg(dir.path())
        .output()
        .expect("run read");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json, serde_json::json!({ "sub": { "empty": {}, "x.txt": "x" } }));
}

#[test]
fn clone_remote_sets_upstreams_unless_disabled() {
    let fixtures = fixtures_dir();
    let repo = built_repo(fixtures.path());
    let remotes = tempfile::tempdir().expect("remotes");

    fixtures_cmd()
        .args(["clone-remote", "--remote-name", "upstream", "--remote-path"])
        .arg(remotes.path().join("up.git"))
        .arg(&repo)
        .assert()
        .success();
    assert_eq!(
        run_git(&repo, &["rev-parse", "--abbrev-ref", "foo@{upstream}"]).trim(),
        "upstream/foo"
    );

    fixtures_cmd()
        .args(["clone-remote", "--no-upstream", "--remote-path"])
        .arg(remotes.path().join("origin.git"))
        .arg(&repo)
        .assert()
        .success();
    assert!(run_git(&repo, &["remote"]).contains("origin"));
    assert_eq!(
        run_git(&repo, &["rev-parse", "--abbrev-ref", "master@{upstream}"]).trim(),
        "upstream/master"
    );

    fs::remove_dir_all(&repo).expect("cleanup");
}

#[test]
fn config_file_overrides_branch_names() {
    let fixtures = fixtures_dir();
    let config_dir = tempfile::tempdir().expect("config dir");
    let config = config_dir.path().join("harness.json");
    fs::write(
        &config,
        r#"{ "default_branch": "main", "secondary_branch": "work" }"#,
    )
    .expect("write config");

    let output = fixtures_cmd()
        .arg("--config")
        .arg(&config)
        .arg("build")
        .arg(fixtures.path())
        .output()
        .expect("run build");
    assert!(output.status.success());
    let repo = PathBuf::from(String::from_utf8(output.stdout).expect("utf8").trim());

    assert_eq!(run_git(&repo, &["branch"]), "  main\n* work\n");

    fs::remove_dir_all(&repo).expect("cleanup");
}

#[test]
fn completions_command_generates_script() {
    fixtures_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_git-fixtures"));
}
