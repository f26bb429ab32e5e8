//! Project file parsing and discovery

use crate::config::types::{ProjectFile, UserDefaults};
use crate::error::{BuildError, ConfigError, ConfigResult};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Project file names to search for
pub const PROJECT_FILE_NAMES: &[&str] = &["plugbuild.yml", "plugbuild.yaml"];

/// User-level defaults file, inside the platform config directory
pub const USER_DEFAULTS_FILE: &str = "defaults.yml";

/// Find the project file by searching current and parent directories
pub fn find_project_file() -> ConfigResult<PathBuf> {
    find_project_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the project file starting from a specific directory
pub fn find_project_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        if let Some(found) = project_file_in(&current_dir) {
            return Ok(found);
        }
        searched_paths.extend(
            PROJECT_FILE_NAMES
                .iter()
                .map(|name| current_dir.join(name).display().to_string()),
        );

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// The project file directly inside `dir`, if there is one
pub fn project_file_in(dir: &Path) -> Option<PathBuf> {
    PROJECT_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Parse a project file from a path
pub fn parse_project_file(path: &Path) -> Result<ProjectFile, BuildError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    parse_project(&contents)
}

/// Parse a project file from a string
pub fn parse_project(yaml: &str) -> Result<ProjectFile, BuildError> {
    if yaml.trim().is_empty() {
        return Ok(ProjectFile::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

/// Location of the user-level defaults file
pub fn user_defaults_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "plugbuild")
        .map(|dirs| dirs.config_dir().join(USER_DEFAULTS_FILE))
}

/// Read user-level defaults; a missing file means no defaults
pub fn load_user_defaults(path: Option<&Path>) -> Result<UserDefaults, BuildError> {
    let Some(path) = path.filter(|path| path.is_file()) else {
        return Ok(UserDefaults::default());
    };
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    if contents.trim().is_empty() {
        return Ok(UserDefaults::default());
    }
    Ok(serde_yaml::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_project_in_current_dir() {
        let temp_dir = TempDir::new().unwrap();
        let project_path = temp_dir.path().join("plugbuild.yml");
        fs::write(&project_path, "plugins: [hook]\n").unwrap();

        let found = find_project_file_from(temp_dir.path().to_path_buf()).unwrap();
        assert_eq!(found, project_path);
    }

    #[test]
    fn test_find_project_in_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let project_path = temp_dir.path().join("plugbuild.yaml");
        let sub_dir = temp_dir.path().join("src");

        fs::create_dir(&sub_dir).unwrap();
        fs::write(&project_path, "plugins: [hook]\n").unwrap();

        let found = find_project_file_from(sub_dir).unwrap();
        assert_eq!(found, project_path);
    }

    #[test]
    fn test_project_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = find_project_file_from(temp_dir.path().to_path_buf());
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_parse_empty_file() {
        let file = parse_project("").unwrap();
        assert!(file.plugins.is_empty());
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = parse_project("plugins: [theme\n");
        assert!(matches!(result, Err(BuildError::Yaml(_))));
    }

    #[test]
    fn test_parse_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = parse_project_file(&temp_dir.path().join("plugbuild.yml"));
        assert!(matches!(
            result,
            Err(BuildError::Config(ConfigError::ReadFile { .. }))
        ));
    }

    #[test]
    fn test_user_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(USER_DEFAULTS_FILE);
        assert!(load_user_defaults(Some(&path)).unwrap().liferay.is_empty());

        fs::write(&path, "liferay:\n  app-server-dir: /opt/tomcat\n").unwrap();
        let defaults = load_user_defaults(Some(&path)).unwrap();
        assert!(defaults.liferay.contains_key("app-server-dir"));
    }
}
