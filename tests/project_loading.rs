//! Integration tests for loading project files and workspaces

mod common;

use common::{create_test_project, write_file, write_project};
use plugbuild::config::{
    find_project_file_from, load_project, load_user_defaults, load_workspace, UserDefaults,
};
use plugbuild::error::{BuildError, ConfigError};
use plugbuild::plugins::base::LIFERAY_EXTENSION;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_find_project_from_nested_dir() {
    let (dir, path) = create_test_project("plugins: [hook]\n");
    let nested = dir.path().join("src/main/webapp");
    fs::create_dir_all(&nested).unwrap();

    assert_eq!(find_project_file_from(nested).unwrap(), path);
}

#[test]
fn test_single_project_workspace() {
    let (_dir, path) = create_test_project("name: login-hook\nplugins: [hook]\n");
    let workspace = load_workspace(&path, &UserDefaults::default()).unwrap();
    assert_eq!(workspace.project_names(), vec!["login-hook"]);

    let project = workspace.project("login-hook").unwrap();
    assert_eq!(project.plugins(), &["hook", "liferay-base"]);
    assert!(project.graph.contains("war"));
    assert!(project.graph.contains("deploy"));
}

#[test]
fn test_members_inherit_liferay_settings() {
    let root = TempDir::new().unwrap();
    let path = write_project(
        root.path(),
        "liferay:\n  app-server-dir: /opt/tomcat\nprojects: [login-hook, news-portlet]\n",
    );
    write_project(&root.path().join("login-hook"), "plugins: [hook]\n");
    write_project(
        &root.path().join("news-portlet"),
        "plugins: [portlet]\nliferay:\n  app-server-dir: /srv/tomcat\n",
    );

    let workspace = load_workspace(&path, &UserDefaults::default()).unwrap();
    for (name, server) in [("login-hook", "/opt/tomcat"), ("news-portlet", "/srv/tomcat")] {
        workspace.plan(name, &["war".to_string()]).unwrap();
        let project = workspace.project(name).unwrap();
        let liferay = project.extensions.slots(LIFERAY_EXTENSION).unwrap();
        assert_eq!(liferay.path("appServerDir").unwrap(), PathBuf::from(server));
    }
}

#[test]
fn test_member_without_project_file() {
    let root = TempDir::new().unwrap();
    let path = write_project(root.path(), "projects: [missing-theme]\n");
    fs::create_dir_all(root.path().join("missing-theme")).unwrap();

    let result = load_workspace(&path, &UserDefaults::default());
    assert!(matches!(result, Err(BuildError::Config(ConfigError::NotFound(_)))));
}

#[test]
fn test_nested_workspaces_rejected() {
    let root = TempDir::new().unwrap();
    let path = write_project(root.path(), "projects: [themes]\n");
    write_project(&root.path().join("themes"), "projects: [blue-theme]\n");

    let result = load_workspace(&path, &UserDefaults::default());
    assert!(matches!(result, Err(BuildError::Config(ConfigError::Invalid(_)))));
}

#[test]
fn test_duplicate_member_names() {
    let root = TempDir::new().unwrap();
    let path = write_project(root.path(), "projects: [one, two]\n");
    write_project(&root.path().join("one"), "name: shared\nplugins: [hook]\n");
    write_project(&root.path().join("two"), "name: shared\nplugins: [layout]\n");

    let result = load_workspace(&path, &UserDefaults::default());
    assert!(matches!(
        result,
        Err(BuildError::Config(ConfigError::DuplicateProject(ref name))) if name == "shared"
    ));
}

#[test]
fn test_user_defaults_fill_in_app_server() {
    let root = TempDir::new().unwrap();
    let defaults_path = root.path().join("defaults.yml");
    write_file(&defaults_path, "liferay:\n  app-server-dir: /opt/user-tomcat\n");
    let defaults = load_user_defaults(Some(&defaults_path)).unwrap();

    let path = write_project(&root.path().join("login-hook"), "plugins: [hook]\n");
    let mut project = load_project(&path, &defaults).unwrap();
    project.evaluate().unwrap();

    let liferay = project.extensions.slots(LIFERAY_EXTENSION).unwrap();
    assert_eq!(
        liferay.path("autoDeployDir").unwrap(),
        PathBuf::from("/opt/user-tomcat/../deploy")
    );
}

#[test]
fn test_env_file_feeds_interpolation() {
    let root = TempDir::new().unwrap();
    let project_dir = root.path().join("login-hook");
    write_file(
        &project_dir.join(".env"),
        "PLUGBUILD_TEST_APP_SERVER=/opt/env-tomcat\n",
    );
    let path = write_project(
        &project_dir,
        "plugins: [hook]\nliferay:\n  app-server-dir: ${PLUGBUILD_TEST_APP_SERVER}\n",
    );

    let mut project = load_project(&path, &UserDefaults::default()).unwrap();
    project.evaluate().unwrap();

    let liferay = project.extensions.slots(LIFERAY_EXTENSION).unwrap();
    assert_eq!(liferay.path("appServerDir").unwrap(), PathBuf::from("/opt/env-tomcat"));
}

#[test]
fn test_unknown_plugin() {
    let (_dir, path) = create_test_project("plugins: [ext]\n");
    let result = load_project(&path, &UserDefaults::default());
    assert!(matches!(
        result,
        Err(BuildError::Config(ConfigError::UnknownPlugin(ref name))) if name == "ext"
    ));
}

#[test]
fn test_late_configuration_rejected() {
    let (_dir, path) = create_test_project("plugins: [hook]\n");
    let mut project = load_project(&path, &UserDefaults::default()).unwrap();
    project.evaluate().unwrap();

    let result = project
        .extensions
        .slots_mut(LIFERAY_EXTENSION)
        .unwrap()
        .set("appServerDir", "/opt/late");
    assert!(matches!(result, Err(ConfigError::LateConfiguration { .. })));
}
