//! Tests for the command line interface

mod common;

use assert_cmd::Command;
use common::{create_test_project, read};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// The binary, isolated from the user's own defaults file
fn plugbuild(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("plugbuild").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_list_tasks() {
    let (dir, _path) = create_test_project("name: blue-theme\nplugins: [theme]\n");

    plugbuild(dir.path())
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("blue-theme"))
        .stdout(predicate::str::contains("mergeTheme"))
        .stdout(predicate::str::contains("buildThumbnail"))
        .stdout(predicate::str::contains("Deploys the plugin"));
}

#[test]
fn test_no_tasks_lists() {
    let (dir, _path) = create_test_project("plugins: [hook]\n");

    plugbuild(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"));
}

#[test]
fn test_dry_run_prints_plan() {
    let (dir, _path) = create_test_project("name: blue-theme\nplugins: [theme]\n");

    plugbuild(dir.path())
        .args(["--dry-run", "war"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "blue-theme: mergeTheme -> buildThumbnail -> sassToCss -> war",
        ));
    assert!(!dir.path().join("build").exists());
}

#[cfg(unix)]
#[test]
fn test_runs_custom_task() {
    let (dir, path) = create_test_project("tasks:\n  hello:\n    run: echo hello > hello.txt\n");
    let elsewhere = TempDir::new().unwrap();

    plugbuild(elsewhere.path())
        .arg("-f")
        .arg(&path)
        .arg("hello")
        .assert()
        .success()
        .stdout(predicate::str::contains("hello"));
    assert_eq!(read(dir.path(), "hello.txt"), "hello\n");
}

#[cfg(unix)]
#[test]
fn test_failing_task_exits_nonzero() {
    let (dir, _path) = create_test_project("tasks:\n  broken:\n    run: exit 3\n");

    plugbuild(dir.path())
        .args(["-q", "broken"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Task 'broken' failed"));
}

#[test]
fn test_missing_project_file() {
    let dir = TempDir::new().unwrap();

    plugbuild(dir.path())
        .arg("--list")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to find project file"));
}

#[test]
fn test_unknown_project() {
    let (dir, _path) = create_test_project("plugins: [hook]\n");

    plugbuild(dir.path())
        .args(["-p", "news-portlet", "war"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("news-portlet"));
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();

    plugbuild(dir.path())
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("plugbuild"));
}
