//! Common test utilities

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write `contents` to `path`, creating parent directories
pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Write a plugbuild.yml into `dir` and return its path
pub fn write_project(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("plugbuild.yml");
    write_file(&path, yaml);
    path
}

/// Create a temporary directory holding a plugbuild.yml
pub fn create_test_project(yaml: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = write_project(temp_dir.path(), yaml);
    (temp_dir, path)
}

/// Lay out a minimal application server with the portal's stock themes
///
/// Returns the application server directory.
pub fn fake_app_server(root: &Path) -> PathBuf {
    let server = root.join("tomcat");
    let portal = server.join("webapps/ROOT");
    let themes = portal.join("html/themes");

    write_file(&themes.join("_unstyled/css/main.css"), "unstyled main");
    write_file(&themes.join("_unstyled/css/custom.css"), "unstyled custom");
    write_file(&themes.join("_unstyled/templates/portal_normal.vm"), "vm");
    write_file(&themes.join("_unstyled/templates/portal_normal.ftl"), "ftl");
    write_file(&themes.join("_unstyled/templates/init.vm"), "init");

    write_file(&themes.join("_styled/css/custom.css"), "styled custom");
    write_file(&themes.join("_styled/images/logo.png"), "logo");

    write_file(&themes.join("classic/css/main.css"), "classic main");
    write_file(&themes.join("classic/_diffs/css/custom.css"), "classic diffs");
    write_file(&themes.join("classic/templates/portal_normal.vm"), "classic vm");
    write_file(&themes.join("classic/templates/portal_normal.ftl"), "classic ftl");

    write_file(&portal.join("WEB-INF/lib/portal-impl.jar"), "");
    write_file(&portal.join("WEB-INF/lib/util-java.jar"), "");
    write_file(&server.join("lib/ext/portal-service.jar"), "");
    fs::create_dir_all(root.join("deploy")).unwrap();
    server
}

/// Project file of a theme with a stock parent
pub fn theme_yaml(app_server: &Path, parent: &str, theme_type: &str) -> String {
    format!(
        "plugins: [theme]\nliferay:\n  app-server-dir: {}\ntheme:\n  parent-theme-name: \"{}\"\n  theme-type: {}\n",
        app_server.display(),
        parent,
        theme_type
    )
}

/// Read a file below `dir` as a string
pub fn read(dir: &Path, relative: &str) -> String {
    fs::read_to_string(dir.join(relative)).unwrap()
}
