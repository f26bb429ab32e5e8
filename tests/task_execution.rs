//! Integration tests for custom shell tasks

#![cfg(unix)]

mod common;

use common::{create_test_project, read};
use plugbuild::config::{load_project, UserDefaults};
use plugbuild::engine::TaskState;
use plugbuild::error::{BuildError, ConfigError, ExecutionError};

fn targets(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[test]
fn test_commands_run_in_project_dir() {
    let (dir, path) = create_test_project(
        r#"
tasks:
  hello:
    run:
      - echo one >> log.txt
      - echo two >> log.txt
"#,
    );

    let mut project = load_project(&path, &UserDefaults::default()).unwrap();
    let report = project.run(&targets(&["hello"])).unwrap();
    assert_eq!(report.state_of("hello"), Some(TaskState::Succeeded));
    assert_eq!(read(dir.path(), "log.txt"), "one\ntwo\n");
}

#[test]
fn test_failing_command_stops_the_build() {
    let (dir, path) = create_test_project(
        r#"
tasks:
  broken:
    run:
      - "false"
      - touch never.txt
  after:
    depends-on: broken
    run: touch after.txt
"#,
    );

    let mut project = load_project(&path, &UserDefaults::default()).unwrap();
    let result = project.run(&targets(&["after"]));
    match result {
        Err(BuildError::TaskFailed {
            task,
            source: ExecutionError::CommandFailed(code),
        }) => {
            assert_eq!(task, "broken");
            assert_eq!(code, Some(1));
        }
        other => panic!("expected a command failure, got {:?}", other),
    }
    assert!(!dir.path().join("never.txt").exists());
    assert!(!dir.path().join("after.txt").exists());
}

#[test]
fn test_dependencies_run_first() {
    let (dir, path) = create_test_project(
        r#"
tasks:
  package:
    depends-on: [compile, resources]
    run: echo package >> order.txt
  compile:
    run: echo compile >> order.txt
  resources:
    depends-on: compile
    run: echo resources >> order.txt
"#,
    );

    let mut project = load_project(&path, &UserDefaults::default()).unwrap();
    let order = project.plan(&targets(&["package"])).unwrap();
    assert_eq!(order, vec!["compile", "resources", "package"]);

    project.run(&targets(&["package"])).unwrap();
    assert_eq!(read(dir.path(), "order.txt"), "compile\nresources\npackage\n");
}

#[test]
fn test_only_if_skips_task() {
    let (dir, path) = create_test_project(
        r#"
tasks:
  lint:
    only-if:
      - exists: src
    run: touch linted.txt
  stamp:
    only-if:
      - not-exists: stamp.txt
    run: touch stamp.txt
"#,
    );

    let mut project = load_project(&path, &UserDefaults::default()).unwrap();
    let report = project.run(&targets(&["lint", "stamp"])).unwrap();
    assert_eq!(report.state_of("lint"), Some(TaskState::Skipped));
    assert_eq!(report.state_of("stamp"), Some(TaskState::Succeeded));
    assert!(!dir.path().join("linted.txt").exists());
    assert!(dir.path().join("stamp.txt").exists());
}

#[test]
fn test_settings_become_variables() {
    let (dir, path) = create_test_project(
        r#"
name: blue-theme
tasks:
  describe:
    settings:
      out-file: ${project.name}.txt
      greeting: hello
    run: echo ${greeting} > ${outFile}
"#,
    );

    let mut project = load_project(&path, &UserDefaults::default()).unwrap();
    project.run(&targets(&["describe"])).unwrap();
    assert_eq!(read(dir.path(), "blue-theme.txt"), "hello\n");
}

#[test]
fn test_plugin_task_extended_with_condition() {
    let (_dir, path) = create_test_project(
        r#"
plugins: [hook]
tasks:
  deploy:
    only-if:
      - env-set: PLUGBUILD_TEST_NEVER_SET
"#,
    );

    let mut project = load_project(&path, &UserDefaults::default()).unwrap();
    let order = project.plan(&targets(&["deploy"])).unwrap();
    assert_eq!(order, vec!["war", "deploy"]);
}

#[test]
fn test_unknown_target() {
    let (_dir, path) = create_test_project("tasks:\n  hello:\n    run: echo hi\n");

    let mut project = load_project(&path, &UserDefaults::default()).unwrap();
    let result = project.run(&targets(&["goodbye"]));
    assert!(matches!(
        result,
        Err(BuildError::Config(ConfigError::TaskNotFound(ref name))) if name == "goodbye"
    ));
}

#[test]
fn test_dependency_cycle_through_plugin_task() {
    let (_dir, path) = create_test_project(
        r#"
plugins: [hook]
tasks:
  war:
    depends-on: check
  check:
    depends-on: deploy
    run: echo check
"#,
    );

    let mut project = load_project(&path, &UserDefaults::default()).unwrap();
    let result = project.plan(&targets(&["deploy"]));
    assert!(matches!(
        result,
        Err(BuildError::Config(ConfigError::CircularDependency(_)))
    ));
}
